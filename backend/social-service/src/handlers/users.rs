/// User handlers - profiles and the follow toggle
use super::detail;
use crate::domain::models::UserChanges;
use crate::error::Result;
use crate::middleware::{authorize, require_actor, MaybeUser, Operation};
use crate::services::ToggleOutcome;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// GET /api/users/ - ordered by username
pub async fn list_users(state: web::Data<AppState>, user: MaybeUser) -> Result<HttpResponse> {
    authorize(Operation::ReadUsers, user.0.as_ref())?;

    let users = state.views.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/users/ - profile without a usable password
pub async fn create_user(
    state: web::Data<AppState>,
    user: MaybeUser,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::CreateUser, user.0, state.store.users.as_ref()).await?;

    let created = state
        .accounts
        .create_profile(&req.username, req.email.as_deref())
        .await?;
    let view = state.views.user_view(&created).await?;

    Ok(HttpResponse::Created().json(view))
}

pub async fn get_user(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    authorize(Operation::ReadUsers, user.0.as_ref())?;

    let view = state.views.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// PUT /api/users/{id}/ - `username` required
pub async fn replace_user(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdateUser, user.0, state.store.users.as_ref()).await?;

    let req = req.into_inner();
    let changes = UserChanges {
        username: Some(req.username),
        email: req.email,
    };
    let updated = state
        .accounts
        .update_user(path.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(state.views.user_view(&updated).await?))
}

pub async fn patch_user(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<PatchUserRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdateUser, user.0, state.store.users.as_ref()).await?;

    let req = req.into_inner();
    let changes = UserChanges {
        username: req.username,
        email: req.email,
    };
    let updated = state
        .accounts
        .update_user(path.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(state.views.user_view(&updated).await?))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_actor(Operation::DeleteUser, user.0, state.store.users.as_ref()).await?;

    state.accounts.delete_user(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/users/{id}/follow/ - 201 when followed, 200 when unfollowed
pub async fn follow(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = require_actor(Operation::ToggleFollow, user.0, state.store.users.as_ref()).await?;

    let outcome = state
        .toggles
        .toggle_follow(actor.user_id, path.into_inner())
        .await?;

    Ok(match outcome {
        ToggleOutcome::Created => {
            HttpResponse::Created().json(detail("Followed successfully."))
        }
        ToggleOutcome::Removed => HttpResponse::Ok().json(detail("Unfollowed successfully.")),
    })
}
