//! Per-client rate limiting middleware.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::LocalBoxFuture;

use fxfeed_core::ports::{RateLimitDecision, RateLimiter};

use crate::middleware::error::AppError;

/// Rate limiting middleware factory. Clients are keyed by peer address;
/// without a limiter every request passes.
pub struct RateLimitMiddleware {
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let Some(limiter) = self.limiter.clone() else {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        };
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(RateLimitDecision::Limited { retry_after }) => {
                    tracing::warn!(
                        client = %key,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "Rate limit exceeded"
                    );
                    let response = HttpResponse::from_error(AppError::RateLimited { retry_after });
                    return Ok(req.into_response(response).map_into_right_body());
                }
                Ok(RateLimitDecision::Allowed) => {}
                Err(e) => {
                    tracing::error!(client = %key, error = %e, "Rate limiter error, failing open");
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use actix_web::{App, test, web};
    use async_trait::async_trait;
    use fxfeed_core::ports::RateLimitError;

    /// Allows the first `quota` calls, then limits.
    struct Countdown(std::sync::Mutex<u32>);

    #[async_trait]
    impl RateLimiter for Countdown {
        async fn check(&self, _client_key: &str) -> Result<RateLimitDecision, RateLimitError> {
            let mut left = self.0.lock().unwrap();
            if *left == 0 {
                return Ok(RateLimitDecision::Limited {
                    retry_after: Duration::from_secs(7),
                });
            }
            *left -= 1;
            Ok(RateLimitDecision::Allowed)
        }
    }

    struct Broken;

    #[async_trait]
    impl RateLimiter for Broken {
        async fn check(&self, _client_key: &str) -> Result<RateLimitDecision, RateLimitError> {
            Err(RateLimitError::Backend("down".into()))
        }
    }

    async fn ping() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_limits_after_quota() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(Countdown(std::sync::Mutex::new(1)));
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Some(limiter)))
                .route("/ping", web::get().to(ping)),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(first.status(), 200);

        let second = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(second.status(), 429);
        assert_eq!(second.headers().get("Retry-After").unwrap(), "7");
        let body: serde_json::Value = test::read_body_json(second).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 429);
    }

    #[actix_web::test]
    async fn test_fails_open() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Some(Arc::new(Broken))))
                .route("/ping", web::get().to(ping)),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(res.status(), 200);
    }
}
