//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `RECEIPTS_*` environment variables and config
//! files. Integration secrets are moved into [`Zeroizing`] buffers as soon
//! as they are converted into [`AdapterSettings`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use receipt_tracker::outbound::billing::DEFAULT_BILLING_BASE_URL;
use receipt_tracker::outbound::gemini::{
    DEFAULT_EXTRACTION_MODEL, DEFAULT_GEMINI_BASE_URL, DEFAULT_INSIGHT_MODEL,
};
use receipt_tracker::outbound::workflow::DEFAULT_WORKFLOW_BASE_URL;

use super::config::AdapterSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STORAGE_DIR: &str = "data/receipts";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/files/";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WORKFLOW_QUEUE_CAPACITY: usize = 64;

/// Errors raised while turning raw settings into adapter settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A URL setting could not be parsed.
    #[error("invalid URL for {name}: {source}")]
    InvalidUrl {
        /// Setting name.
        name: &'static str,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The bind address could not be parsed.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        /// Rejected value.
        value: String,
        /// Parser failure.
        #[source]
        source: std::net::AddrParseError,
    },
    /// A numeric setting must be positive.
    #[error("{name} must be greater than zero")]
    Zero {
        /// Setting name.
        name: &'static str,
    },
}

/// Runtime settings for the receipt tracker server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECEIPTS")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; in-memory stores are used without one.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Directory holding uploaded receipt files.
    pub storage_dir: Option<PathBuf>,
    /// Base URL under which stored files are served.
    pub public_base_url: Option<String>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Timeout applied to outbound HTTP calls, in seconds.
    pub http_timeout_secs: Option<u64>,
    /// Gemini API key; template answers are used without one.
    pub gemini_api_key: Option<String>,
    /// Gemini API root.
    pub gemini_base_url: Option<String>,
    /// Billing API key; every user is on the free plan without one.
    pub billing_api_key: Option<String>,
    /// Billing API root.
    pub billing_base_url: Option<String>,
    /// Event key for the hosted workflow runtime; the in-process queue is
    /// used without one.
    pub workflow_event_key: Option<String>,
    /// Secret expected in `X-Workflow-Signature` on workflow callbacks.
    pub workflow_signing_key: Option<String>,
    /// Hosted workflow runtime root.
    pub workflow_base_url: Option<String>,
    /// Pending events held by the in-process workflow queue.
    pub workflow_queue_capacity: Option<usize>,
}

fn secret(value: Option<String>) -> Option<Zeroizing<String>> {
    value
        .map(Zeroizing::new)
        .filter(|key| !key.trim().is_empty())
}

fn parse_url(name: &'static str, value: Option<&str>, default: &str) -> Result<Url, SettingsError> {
    Url::parse(value.unwrap_or(default)).map_err(|source| SettingsError::InvalidUrl { name, source })
}

impl AppSettings {
    /// Return the bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBindAddr`] for unparsable addresses.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    /// Return the configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Consume the settings, moving secrets into zeroizing buffers.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a URL is malformed or a size is zero.
    pub fn into_adapter_settings(self) -> Result<AdapterSettings, SettingsError> {
        let max_upload_bytes = self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes == 0 {
            return Err(SettingsError::Zero {
                name: "max_upload_bytes",
            });
        }
        let workflow_queue_capacity = self
            .workflow_queue_capacity
            .unwrap_or(DEFAULT_WORKFLOW_QUEUE_CAPACITY);
        if workflow_queue_capacity == 0 {
            return Err(SettingsError::Zero {
                name: "workflow_queue_capacity",
            });
        }
        Ok(AdapterSettings {
            storage_dir: self
                .storage_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            public_base_url: parse_url(
                "public_base_url",
                self.public_base_url.as_deref(),
                DEFAULT_PUBLIC_BASE_URL,
            )?,
            max_upload_bytes,
            http_timeout: Duration::from_secs(
                self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            gemini_api_key: secret(self.gemini_api_key),
            gemini_base_url: parse_url(
                "gemini_base_url",
                self.gemini_base_url.as_deref(),
                DEFAULT_GEMINI_BASE_URL,
            )?,
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_owned(),
            insight_model: DEFAULT_INSIGHT_MODEL.to_owned(),
            billing_api_key: secret(self.billing_api_key),
            billing_base_url: parse_url(
                "billing_base_url",
                self.billing_base_url.as_deref(),
                DEFAULT_BILLING_BASE_URL,
            )?,
            workflow_event_key: secret(self.workflow_event_key),
            workflow_signing_key: secret(self.workflow_signing_key),
            workflow_base_url: parse_url(
                "workflow_base_url",
                self.workflow_base_url.as_deref(),
                DEFAULT_WORKFLOW_BASE_URL,
            )?,
            workflow_queue_capacity,
        })
    }
}
