//! Local filesystem adapter for the `FileStorage` port.
//!
//! Files live flat inside one capability-scoped directory, so keys can never
//! escape it. Public URLs are formed by joining the key onto a configured base
//! URL, which the server exposes under `/files/{key}`.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use url::Url;

use crate::domain::StorageKey;
use crate::domain::ports::{FileStorage, FileStorageError};

/// `FileStorage` backed by a directory on the local disk.
#[derive(Clone)]
pub struct LocalFileStorage {
    dir: Arc<Dir>,
    public_base: Url,
}

impl LocalFileStorage {
    /// Open (creating if needed) `root` and serve files below `public_base`.
    ///
    /// A missing trailing slash on `public_base` is added so keys are joined
    /// as children rather than replacing the last path segment.
    pub fn open(root: &Path, mut public_base: Url) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Ok(Self {
            dir: Arc::new(dir),
            public_base,
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, FileStorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, FileStorageError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|err| FileStorageError::io(err.to_string()))?
    }
}

fn map_io_error(key: &str, error: &io::Error) -> FileStorageError {
    if error.kind() == io::ErrorKind::NotFound {
        FileStorageError::not_found(key)
    } else {
        FileStorageError::io(format!("{key}: {error}"))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), FileStorageError> {
        let key = key.to_string();
        let bytes = bytes.to_vec();
        self.blocking(move |dir| dir.write(&key, bytes).map_err(|err| map_io_error(&key, &err)))
            .await
    }

    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, FileStorageError> {
        let key = key.to_string();
        self.blocking(move |dir| dir.read(&key).map_err(|err| map_io_error(&key, &err)))
            .await
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), FileStorageError> {
        let key = key.to_string();
        self.blocking(move |dir| match dir.remove_file(&key) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io_error(&key, &err)),
        })
        .await
    }

    fn public_url(&self, key: &StorageKey) -> Result<Url, FileStorageError> {
        self.public_base
            .join(key.as_ref())
            .map_err(|err| FileStorageError::invalid_url(err.to_string()))
    }
}
