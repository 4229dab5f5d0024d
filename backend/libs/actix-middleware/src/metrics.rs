use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures::future::{ready, Ready};
use prometheus::{HistogramVec, IntCounterVec};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

/// Prometheus Metrics Middleware
///
/// Requests are labelled by route pattern (`/api/posts/{id}/`) rather than the
/// raw path so ids do not explode label cardinality.
pub struct MetricsMiddleware;

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "route", "status"]
    ).expect("failed to register http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).expect("failed to register http_request_duration_seconds");
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let start = Instant::now();
        let method = req.method().to_string();

        // rejected requests (e.g. a bad bearer token) never reach routing
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());

        Box::pin(async move {
            let result = service.call(req).await;
            let (route, status) = match &result {
                Ok(res) => (
                    res.request().match_pattern().unwrap_or(route),
                    res.status(),
                ),
                Err(err) => (route, err.as_response_error().status_code()),
            };
            let status = status.as_u16().to_string();
            let duration = start.elapsed().as_secs_f64();

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, &status])
                .inc();

            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route, &status])
                .observe(duration);

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_requests_are_counted_by_route_pattern() {
        let app = test::init_service(
            App::new().wrap(MetricsMiddleware).route(
                "/items/{id}",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        let before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/items/{id}", "200"])
            .get();

        for id in ["a", "b"] {
            let req = test::TestRequest::get()
                .uri(&format!("/items/{}", id))
                .to_request();
            test::call_service(&app, req).await;
        }

        let after = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/items/{id}", "200"])
            .get();
        assert_eq!(after - before, 2);
    }

    #[actix_web::test]
    async fn test_requests_rejected_by_inner_middleware_are_counted() {
        crypto_core::test_utils::init_test_keys();
        let app = test::init_service(
            App::new()
                .wrap(crate::JwtAuthMiddleware)
                .wrap(MetricsMiddleware)
                .route(
                    "/guarded/{id}",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        )
        .await;

        let counted = || {
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["GET", "/guarded/{id}", "401"])
                .get()
        };
        let before = counted();

        let req = test::TestRequest::get()
            .uri("/guarded/a")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let _ = test::try_call_service(&app, req).await;

        assert_eq!(counted() - before, 1);
    }
}
