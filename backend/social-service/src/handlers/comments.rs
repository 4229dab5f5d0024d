/// Comment handlers - always addressed through their post
use super::{ContentRequest, PatchContentRequest};
use crate::error::Result;
use crate::middleware::{authorize, require_actor, MaybeUser, Operation};
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// GET /api/posts/{post_id}/comments/ - oldest first
pub async fn list_comments(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    authorize(Operation::ReadComments, user.0.as_ref())?;

    let comments = state.views.list_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn create_comment(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<Uuid>,
    req: web::Json<ContentRequest>,
) -> Result<HttpResponse> {
    let actor = require_actor(Operation::CreateComment, user.0, state.store.users.as_ref()).await?;

    let comment = state
        .content
        .create_comment(path.into_inner(), actor.user_id, &req.content)
        .await?;
    Ok(HttpResponse::Created().json(state.views.comment_view(&comment).await?))
}

pub async fn get_comment(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    authorize(Operation::ReadComments, user.0.as_ref())?;

    let (post_id, comment_id) = path.into_inner();
    let comment = state.views.get_comment(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn replace_comment(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<ContentRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdateComment, user.0, state.store.users.as_ref()).await?;

    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .content
        .update_comment(post_id, comment_id, Some(req.content.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(state.views.comment_view(&comment).await?))
}

pub async fn patch_comment(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<PatchContentRequest>,
) -> Result<HttpResponse> {
    require_actor(Operation::UpdateComment, user.0, state.store.users.as_ref()).await?;

    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .content
        .update_comment(post_id, comment_id, req.content.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.comment_view(&comment).await?))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    require_actor(Operation::DeleteComment, user.0, state.store.users.as_ref()).await?;

    let (post_id, comment_id) = path.into_inner();
    state.content.delete_comment(post_id, comment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
