//! Port for receipt file storage.

use async_trait::async_trait;
use url::Url;

use crate::domain::StorageKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by file storage adapters.
    pub enum FileStorageError {
        /// No file is stored under the key.
        NotFound { key: String } =>
            "no stored file for key {key}",
        /// Underlying storage operation failed.
        Io { message: String } =>
            "file storage failed: {message}",
        /// Public URL could not be formed.
        InvalidUrl { message: String } =>
            "file storage url invalid: {message}",
    }
}

/// Port for storing, reading, and removing uploaded files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing file.
    async fn put(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), FileStorageError>;

    /// Read the file stored under `key`.
    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, FileStorageError>;

    /// Remove the file stored under `key`.
    ///
    /// Removing an absent file succeeds.
    async fn delete(&self, key: &StorageKey) -> Result<(), FileStorageError>;

    /// Public URL from which clients can download the file.
    fn public_url(&self, key: &StorageKey) -> Result<Url, FileStorageError>;
}

/// Fixture implementation that accepts writes and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFileStorage;

#[async_trait]
impl FileStorage for FixtureFileStorage {
    async fn put(&self, _key: &StorageKey, _bytes: &[u8]) -> Result<(), FileStorageError> {
        Ok(())
    }

    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, FileStorageError> {
        Err(FileStorageError::not_found(key.to_string()))
    }

    async fn delete(&self, _key: &StorageKey) -> Result<(), FileStorageError> {
        Ok(())
    }

    fn public_url(&self, key: &StorageKey) -> Result<Url, FileStorageError> {
        Url::parse("http://localhost/files/")
            .and_then(|base| base.join(key.as_ref()))
            .map_err(|err| FileStorageError::invalid_url(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_reports_missing_files() {
        let storage = FixtureFileStorage;
        let key = StorageKey::generate_pdf();

        storage.put(&key, b"%PDF").await.expect("put succeeds");
        let error = storage.get(&key).await.expect_err("nothing is stored");
        assert!(matches!(error, FileStorageError::NotFound { .. }));
    }

    #[test]
    fn fixture_url_ends_with_key() {
        let key = StorageKey::generate_pdf();
        let url = FixtureFileStorage.public_url(&key).expect("url");
        assert!(url.as_str().ends_with(key.as_ref()));
    }
}
