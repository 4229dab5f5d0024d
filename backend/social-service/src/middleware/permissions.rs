/// Authorization gate for social-service
///
/// Every operation has a requirement; operations not listed as public need an
/// authenticated caller. Content writes are not restricted to the author.
use crate::error::{AppError, Result};
use crate::repository::UserStore;
use actix_middleware::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    ObtainToken,
    RefreshToken,
    ReadUsers,
    ReadPosts,
    ReadComments,
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreatePost,
    UpdatePost,
    DeletePost,
    CreateComment,
    UpdateComment,
    DeleteComment,
    ToggleFollow,
    ToggleLike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
}

pub fn requirement(op: Operation) -> Requirement {
    match op {
        Operation::Register
        | Operation::ObtainToken
        | Operation::RefreshToken
        | Operation::ReadUsers
        | Operation::ReadPosts
        | Operation::ReadComments => Requirement::Public,
        _ => Requirement::Authenticated,
    }
}

/// Check `identity` against the requirement of `op`
pub fn authorize(op: Operation, identity: Option<&AuthUser>) -> Result<()> {
    match (requirement(op), identity) {
        (Requirement::Public, _) | (Requirement::Authenticated, Some(_)) => Ok(()),
        (Requirement::Authenticated, None) => {
            tracing::debug!(operation = ?op, "anonymous caller rejected");
            Err(AppError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            ))
        }
    }
}

/// Authorize `op` and return the acting user
///
/// A token outlives its account, so the identity must still resolve to a user.
pub async fn require_actor(
    op: Operation,
    identity: Option<AuthUser>,
    users: &dyn UserStore,
) -> Result<AuthUser> {
    authorize(op, identity.as_ref())?;
    let actor = identity.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;

    if users.get_user(actor.user_id).await?.is_none() {
        tracing::warn!(user_id = %actor.user_id, operation = ?op, "token for deleted account rejected");
        return Err(AppError::Unauthorized("User not found".to_string()));
    }
    Ok(actor)
}
