//! Receipt tracker entry-point: loads settings, wires adapters and serves the
//! REST API and OpenAPI docs.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use receipt_tracker::inbound::http::health::HealthState;
use receipt_tracker::inbound::http::session_config::{BuildMode, session_settings_from_env};
use receipt_tracker::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let env = DefaultEnv::new();
    let session = session_settings_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr()?;
    let db_pool = connect_database(&settings).await?;
    let adapters = settings.into_adapter_settings()?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        adapters,
    );
    if let Some(pool) = db_pool {
        config = config.with_db_pool(pool);
    }
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(initialize_metrics(|| {
        PrometheusMetricsBuilder::new("receipts")
            .endpoint("/metrics")
            .build()
    }));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to start server")?;
    info!(%bind_addr, "receipt tracker listening");
    server.await.wrap_err("server terminated")
}

async fn connect_database(settings: &AppSettings) -> Result<Option<DbPool>> {
    let Some(url) = settings.database_url() else {
        return Ok(None);
    };
    run_migrations(url).await.wrap_err("migrations failed")?;
    let mut pool_config = PoolConfig::new(url);
    if let Some(max) = settings.database_max_connections {
        pool_config = pool_config.with_max_size(max).with_min_idle(Some(max.min(2)));
    }
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;
    Ok(Some(pool))
}

/// Build Prometheus middleware, degrading to no metrics on failure.
#[cfg(feature = "metrics")]
fn initialize_metrics<E: std::fmt::Display>(
    build: impl FnOnce() -> Result<actix_web_prom::PrometheusMetrics, E>,
) -> Option<actix_web_prom::PrometheusMetrics> {
    match build() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "Prometheus metrics disabled");
            None
        }
    }
}
