//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::AppSettings;

#[cfg(feature = "metrics")]
use metrics::RequestMetrics;
use state_builders::build_http_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use receipt_tracker::Trace;
#[cfg(debug_assertions)]
use receipt_tracker::doc::ApiDoc;
#[cfg(debug_assertions)]
use receipt_tracker::inbound::http::debug::{dispatch_workflow_event, workflow_config};
use receipt_tracker::inbound::http::files::download_file;
use receipt_tracker::inbound::http::health::{HealthState, live, ready};
use receipt_tracker::inbound::http::insights::{direct_analysis, generate_insights};
use receipt_tracker::inbound::http::receipts::{
    delete_receipt, get_receipt, list_receipts, receipt_download_url, receipt_status,
    upload_receipt,
};
use receipt_tracker::inbound::http::sessions::{create_session, delete_session};
use receipt_tracker::inbound::http::state::HttpState;
use receipt_tracker::inbound::http::usage::{feature_usage, usage_summary};
use receipt_tracker::inbound::http::workflows::handle_workflow_event;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
    max_upload_bytes: usize,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
        max_upload_bytes,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let payload = web::PayloadConfig::new(max_upload_bytes);

    let api = web::scope("/api/v1")
        .wrap(session)
        .app_data(payload)
        .service(create_session)
        .service(delete_session)
        .service(upload_receipt)
        .service(list_receipts)
        .service(receipt_status)
        .service(get_receipt)
        .service(receipt_download_url)
        .service(delete_receipt)
        .service(direct_analysis)
        .service(generate_insights)
        .service(usage_summary)
        .service(feature_usage)
        .service(handle_workflow_event);

    #[cfg(debug_assertions)]
    let api = api
        .service(dispatch_workflow_event)
        .service(workflow_config);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(download_file)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing session, binding, adapter,
///   and optional metrics settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when an adapter cannot be built, or binding
/// the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config.adapters, config.db_pool.as_ref())?;
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        adapters,
        db_pool: _,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let max_upload_bytes = adapters.max_upload_bytes;

    #[cfg(feature = "metrics")]
    let request_metrics = RequestMetrics::new(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
            max_upload_bytes,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(request_metrics.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
