//! Request metrics middleware that passes requests straight through when
//! Prometheus is not configured.

use std::sync::Arc;

use actix_service::boxed::{self, BoxService};
use actix_service::{Service, ServiceExt as _, Transform};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::PrometheusMetrics;
use futures_util::future::{self, LocalBoxFuture};

type BoxedService = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;

/// Optional Prometheus middleware shared across server workers.
#[derive(Clone)]
pub(crate) struct RequestMetrics(Option<Arc<PrometheusMetrics>>);

impl RequestMetrics {
    pub(crate) fn new(metrics: Option<PrometheusMetrics>) -> Self {
        Self(metrics.map(Arc::new))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxedService;
    type Future = LocalBoxFuture<'static, Result<BoxedService, ()>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let Some(metrics) = self.0.as_deref() else {
            let passthrough = service.map(ServiceResponse::map_into_boxed_body);
            return Box::pin(future::ok(boxed::service(passthrough)));
        };
        let pending = Compat::new(metrics.clone()).new_transform(service);
        Box::pin(async move { pending.await.map(boxed::service) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use actix_web_prom::PrometheusMetricsBuilder;

    async fn status_of(metrics: RequestMetrics, path: &str) -> u16 {
        let app = actix_test::init_service(
            App::new()
                .wrap(metrics)
                .route("/ping", web::get().to(HttpResponse::NoContent)),
        )
        .await;
        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(path).to_request())
                .await;
        res.status().as_u16()
    }

    #[actix_rt::test]
    async fn disabled_metrics_pass_requests_through() {
        assert_eq!(status_of(RequestMetrics::new(None), "/ping").await, 204);
        assert_eq!(status_of(RequestMetrics::new(None), "/metrics").await, 404);
    }

    #[actix_rt::test]
    async fn enabled_metrics_expose_the_scrape_endpoint() {
        let prometheus = PrometheusMetricsBuilder::new("receipts_test")
            .endpoint("/metrics")
            .build()
            .expect("metrics build");
        let metrics = RequestMetrics::new(Some(prometheus));

        assert_eq!(status_of(metrics.clone(), "/ping").await, 204);
        assert_eq!(status_of(metrics, "/metrics").await, 200);
    }
}
