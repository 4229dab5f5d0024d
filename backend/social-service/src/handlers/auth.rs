/// Registration and token endpoints
use crate::error::Result;
use crate::middleware::{authorize, MaybeUser, Operation};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// POST /api/register/
pub async fn register(
    state: web::Data<AppState>,
    user: MaybeUser,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    authorize(Operation::Register, user.0.as_ref())?;

    state
        .accounts
        .register(
            req.username.as_deref(),
            req.password.as_deref(),
            req.email.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User created successfully."
    })))
}

/// POST /api/token/ - returns `{access, refresh}`
pub async fn obtain_token(
    state: web::Data<AppState>,
    user: MaybeUser,
    req: web::Json<TokenRequest>,
) -> Result<HttpResponse> {
    authorize(Operation::ObtainToken, user.0.as_ref())?;

    let pair = state
        .accounts
        .obtain_token(req.username.as_deref(), req.password.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// POST /api/token/refresh/ - returns `{access}`
pub async fn refresh_token(
    state: web::Data<AppState>,
    user: MaybeUser,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    authorize(Operation::RefreshToken, user.0.as_ref())?;

    let access = state.accounts.refresh(req.refresh.as_deref()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "access": access })))
}
