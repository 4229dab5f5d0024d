//! Post and comment writes
//!
//! The author of new content is always the acting user. Updates and deletes
//! only require an authenticated caller; ownership is not checked.

use crate::domain::models::{Comment, Post};
use crate::error::{AppError, Result};
use crate::repository::{CommentStore, PostStore, Store, UserStore};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct ContentService {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "content: This field may not be blank.".to_string(),
        ));
    }
    Ok(())
}

impl ContentService {
    pub fn new(store: &Store) -> Self {
        Self {
            users: store.users.clone(),
            posts: store.posts.clone(),
            comments: store.comments.clone(),
        }
    }

    pub async fn create_post(&self, actor: Uuid, content: &str) -> Result<Post> {
        validate_content(content)?;

        let post = self.posts.create_post(actor, content).await?;
        info!(post_id = %post.id, author_id = %actor, "post created");
        Ok(post)
    }

    /// Create through `/users/{id}/posts/`: the path user must exist, the author is still the actor
    pub async fn create_post_under_user(
        &self,
        path_user: Uuid,
        actor: Uuid,
        content: &str,
    ) -> Result<Post> {
        if self.users.get_user(path_user).await?.is_none() {
            return Err(AppError::not_found("User"));
        }
        self.create_post(actor, content).await
    }

    /// `None` leaves the content unchanged (partial update without fields)
    pub async fn update_post(&self, post_id: Uuid, content: Option<&str>) -> Result<Post> {
        let updated = match content {
            Some(content) => {
                validate_content(content)?;
                self.posts.update_post(post_id, content).await?
            }
            None => self.posts.get_post(post_id).await?,
        };

        updated.ok_or_else(|| AppError::not_found("Post"))
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        if !self.posts.delete_post(post_id).await? {
            return Err(AppError::not_found("Post"));
        }
        info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    pub async fn create_comment(&self, post_id: Uuid, actor: Uuid, content: &str) -> Result<Comment> {
        if self.posts.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }
        validate_content(content)?;

        // a post deleted after the check above surfaces as MissingReference -> 404
        let comment = self.comments.create_comment(post_id, actor, content).await?;
        info!(comment_id = %comment.id, post_id = %post_id, author_id = %actor, "comment created");
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        content: Option<&str>,
    ) -> Result<Comment> {
        self.comment_of_post(post_id, comment_id).await?;

        let updated = match content {
            Some(content) => {
                validate_content(content)?;
                self.comments.update_comment(comment_id, content).await?
            }
            None => self.comments.get_comment(comment_id).await?,
        };

        updated.ok_or_else(|| AppError::not_found("Comment"))
    }

    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<()> {
        self.comment_of_post(post_id, comment_id).await?;

        if !self.comments.delete_comment(comment_id).await? {
            return Err(AppError::not_found("Comment"));
        }
        info!(comment_id = %comment_id, post_id = %post_id, "comment deleted");
        Ok(())
    }

    async fn comment_of_post(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        self.comments
            .get_comment(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| AppError::not_found("Comment"))
    }
}
