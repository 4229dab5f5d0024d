/// HTTP handlers for social-service
///
/// All API routes live under `/api/` and end with a trailing slash:
/// - Auth: register, token, token refresh
/// - Users: CRUD, follow toggle, nested posts
/// - Posts: CRUD, like toggle
/// - Comments: CRUD nested under a post
///
/// Probes and metrics (`/health`, `/ready`, `/metrics`) sit at the root.
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

use crate::error::AppError;
use crate::metrics::serve_metrics;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Body for full updates and creates of text content
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Body for partial updates of text content
#[derive(Debug, Deserialize)]
pub struct PatchContentRequest {
    pub content: Option<String>,
}

pub(crate) fn detail(message: &str) -> serde_json::Value {
    serde_json::json!({ "detail": message })
}

async fn api_root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "users": "/api/users/",
        "posts": "/api/posts/",
    }))
}

/// Register every route and the extractor error handlers
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Not found.".to_string()).into()),
    )
    .route("/health", web::get().to(health::health))
    .route("/ready", web::get().to(health::ready))
    .route("/metrics", web::get().to(serve_metrics))
    .service(
        web::scope("/api")
            .route("/", web::get().to(api_root))
            // Auth
            .route("/register/", web::post().to(auth::register))
            .route("/token/", web::post().to(auth::obtain_token))
            .route("/token/refresh/", web::post().to(auth::refresh_token))
            // Users
            .service(
                web::resource("/users/")
                    .route(web::get().to(users::list_users))
                    .route(web::post().to(users::create_user)),
            )
            .service(
                web::resource("/users/{id}/")
                    .route(web::get().to(users::get_user))
                    .route(web::put().to(users::replace_user))
                    .route(web::patch().to(users::patch_user))
                    .route(web::delete().to(users::delete_user)),
            )
            .route("/users/{id}/follow/", web::post().to(users::follow))
            .service(
                web::resource("/users/{id}/posts/")
                    .route(web::get().to(posts::list_user_posts))
                    .route(web::post().to(posts::create_user_post)),
            )
            // Posts
            .service(
                web::resource("/posts/")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/posts/{id}/")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::replace_post))
                    .route(web::patch().to(posts::patch_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            .route("/posts/{id}/like/", web::post().to(posts::like))
            // Comments
            .service(
                web::resource("/posts/{post_id}/comments/")
                    .route(web::get().to(comments::list_comments))
                    .route(web::post().to(comments::create_comment)),
            )
            .service(
                web::resource("/posts/{post_id}/comments/{id}/")
                    .route(web::get().to(comments::get_comment))
                    .route(web::put().to(comments::replace_comment))
                    .route(web::patch().to(comments::patch_comment))
                    .route(web::delete().to(comments::delete_comment)),
            ),
    );
}
