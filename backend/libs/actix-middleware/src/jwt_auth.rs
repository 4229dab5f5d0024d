use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

/// Identity extracted from a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Identity of the caller, `None` for anonymous requests
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// JWT identity middleware
///
/// - no `Authorization` header: request continues anonymously
/// - `Bearer <access token>`: [`AuthUser`] is stored in request extensions
/// - anything else (wrong scheme, bad signature, expired, refresh token): 401
///
/// Whether an operation needs an identity is decided downstream.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

fn unauthorized(message: &'static str) -> Error {
    let body = serde_json::json!({
        "error": message,
        "status": 401,
    });
    InternalError::from_response(message, HttpResponse::Unauthorized().json(body)).into()
}

/// Resolve the identity carried by an `Authorization` header value
fn authenticate(header_value: &str) -> Result<AuthUser, Error> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

    let claims = crypto_core::jwt::validate_access_token(token.trim()).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        unauthorized("Given token not valid for any token type")
    })?;

    let user_id = claims.user_id().map_err(|e| {
        tracing::error!("Invalid user_id UUID in token: {}", e);
        unauthorized("Invalid token: malformed user_id")
    })?;

    Ok(AuthUser {
        user_id,
        username: claims.username,
    })
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let header = match req.headers().get("Authorization") {
                None => None,
                Some(value) => Some(
                    value
                        .to_str()
                        .map_err(|_| unauthorized("Invalid Authorization header format"))?
                        .to_owned(),
                ),
            };

            if let Some(header) = header {
                let user = authenticate(&header)?;
                tracing::debug!(user_id = %user.user_id, "request authenticated");
                req.extensions_mut().insert(user);
            }

            service.call(req).await
        })
    }
}

impl actix_web::FromRequest for MaybeUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        ready(Ok(MaybeUser(req.extensions().get::<AuthUser>().cloned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, ResponseError};
    use crypto_core::test_utils::init_test_keys;

    async fn whoami(user: MaybeUser) -> HttpResponse {
        match user.0 {
            Some(user) => HttpResponse::Ok().body(user.username),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(JwtAuthMiddleware)
                    .route("/whoami", web::get().to(whoami)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_missing_header_is_anonymous() {
        init_test_keys();
        let app = app!();

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn test_valid_access_token_sets_identity() {
        init_test_keys();
        let app = app!();
        let token = crypto_core::jwt::generate_access_token(Uuid::new_v4(), "alice").unwrap();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "alice");
    }

    #[actix_web::test]
    async fn test_invalid_token_rejected_even_on_public_route() {
        init_test_keys();
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_a_bearer_token() {
        init_test_keys();
        let app = app!();
        let pair = crypto_core::jwt::generate_token_pair(Uuid::new_v4(), "alice").unwrap();

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", pair.refresh)))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
