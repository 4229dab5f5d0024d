/// Post handlers - HTTP endpoints for post operations
use super::{detail, ContentRequest, PatchContentRequest};
use crate::error::Result;
use crate::middleware::{authorize, require_actor, MaybeUser, Operation};
use crate::services::ToggleOutcome;
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// GET /api/posts/ - newest first
pub async fn list_posts(state: web::Data<AppState>, user: MaybeUser) -> Result<HttpResponse> {
    authorize(Operation::ReadPosts, user.0.as_ref())?;

    let posts = state.views.list_posts(None).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/users/{id}/posts/ - that user's posts, newest first
pub async fn list_user_posts(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    authorize(Operation::ReadPosts, user.0.as_ref())?;

    let posts = state.views.list_posts(Some(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/posts/ - authored by the caller
pub async fn create_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    req: web::Json<ContentRequest>,
) -> Result<HttpResponse> {
    let actor = require_actor(Operation::CreatePost, user.0, state.store.users.as_ref()).await?;

    let post = state.content.create_post(actor.user_id, &req.content).await?;
    Ok(HttpResponse::Created().json(state.views.post_view(&post).await?))
}

/// POST /api/users/{id}/posts/ - still authored by the caller, not the path user
pub async fn create_user_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<ContentRequest>,
) -> Result<HttpResponse> {
    let actor = require_actor(Operation::CreatePost, user.0, state.store.users.as_ref()).await?;

    let post = state
        .content
        .create_post_under_user(path.into_inner(), actor.user_id, &req.content)
        .await?;
    Ok(HttpResponse::Created().json(state.views.post_view(&post).await?))
}

pub async fn get_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    authorize(Operation::ReadPosts, user.0.as_ref())?;

    let post = state.views.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn replace_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<ContentRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdatePost, user.0, state.store.users.as_ref()).await?;

    let post = state
        .content
        .update_post(path.into_inner(), Some(req.content.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(state.views.post_view(&post).await?))
}

pub async fn patch_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<PatchContentRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdatePost, user.0, state.store.users.as_ref()).await?;

    let post = state
        .content
        .update_post(path.into_inner(), req.content.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.post_view(&post).await?))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_actor(Operation::DeletePost, user.0, state.store.users.as_ref()).await?;

    state.content.delete_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/like/ - 201 when liked, 200 when unliked
pub async fn like(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = require_actor(Operation::ToggleLike, user.0, state.store.users.as_ref()).await?;

    let outcome = state
        .toggles
        .toggle_like(actor.user_id, path.into_inner())
        .await?;

    Ok(match outcome {
        ToggleOutcome::Created => HttpResponse::Created().json(detail("Liked successfully.")),
        ToggleOutcome::Removed => HttpResponse::Ok().json(detail("Unliked successfully.")),
    })
}
