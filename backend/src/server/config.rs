//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use receipt_tracker::outbound::persistence::DbPool;
use url::Url;
use zeroize::Zeroizing;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Storage locations, limits and integration credentials for the adapters.
#[derive(Debug)]
pub struct AdapterSettings {
    /// Directory holding uploaded files.
    pub storage_dir: PathBuf,
    /// Base URL stored files are served under.
    pub public_base_url: Url,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
    /// Timeout for outbound HTTP calls.
    pub http_timeout: Duration,
    /// Gemini API key; fixture extractor and generator are used without one.
    pub gemini_api_key: Option<Zeroizing<String>>,
    /// Gemini API root.
    pub gemini_base_url: Url,
    /// Model reading receipt PDFs.
    pub extraction_model: String,
    /// Model writing insights.
    pub insight_model: String,
    /// Billing API key.
    pub billing_api_key: Option<Zeroizing<String>>,
    /// Billing API root.
    pub billing_base_url: Url,
    /// Hosted workflow event key; the in-process queue is used without one.
    pub workflow_event_key: Option<Zeroizing<String>>,
    /// Secret expected on inbound workflow callbacks.
    pub workflow_signing_key: Option<Zeroizing<String>>,
    /// Hosted workflow runtime root.
    pub workflow_base_url: Url,
    /// Capacity of the in-process workflow queue.
    pub workflow_queue_capacity: usize,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) adapters: AdapterSettings,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from session and adapter settings.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        adapters: AdapterSettings,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            adapters,
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// With a pool the receipt and usage stores are PostgreSQL-backed;
    /// without one they live in process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

#[cfg(test)]
impl AdapterSettings {
    /// Settings with every integration unset and files under `root`.
    pub(crate) fn for_tests(root: &std::path::Path) -> Self {
        let unroutable = || Url::parse("http://127.0.0.1:9/").expect("literal URL");
        Self {
            storage_dir: root.join("files"),
            public_base_url: Url::parse("http://localhost:8080/files/").expect("literal URL"),
            max_upload_bytes: 1024,
            http_timeout: Duration::from_secs(5),
            gemini_api_key: None,
            gemini_base_url: unroutable(),
            extraction_model: "extract".to_owned(),
            insight_model: "insight".to_owned(),
            billing_api_key: None,
            billing_base_url: unroutable(),
            workflow_event_key: None,
            workflow_signing_key: None,
            workflow_base_url: unroutable(),
            workflow_queue_capacity: 8,
        }
    }
}
