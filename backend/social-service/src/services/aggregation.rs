//! Read-side projections
//!
//! Counts are derived from the relationship store on every read; nothing is
//! cached, so a view always agrees with the edge set at the time it was built.

use crate::domain::models::{Comment, CommentView, EdgeKind, Post, PostView, User, UserView};
use crate::error::{AppError, Result};
use crate::repository::{CommentStore, PostStore, RelationshipStore, Store, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct Aggregator {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
    edges: Arc<dyn RelationshipStore>,
}

impl Aggregator {
    pub fn new(store: &Store) -> Self {
        Self {
            users: store.users.clone(),
            posts: store.posts.clone(),
            comments: store.comments.clone(),
            edges: store.edges.clone(),
        }
    }

    pub async fn followers_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.edges.count_incoming(EdgeKind::Follows, user_id).await?)
    }

    pub async fn following_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.edges.count_outgoing(EdgeKind::Follows, user_id).await?)
    }

    pub async fn likes_count(&self, post_id: Uuid) -> Result<i64> {
        Ok(self.edges.count_incoming(EdgeKind::Likes, post_id).await?)
    }

    /// Comments of a post, oldest first
    pub async fn comments_of(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.comments.comments_for_post(post_id).await?)
    }

    pub async fn user_view(&self, user: &User) -> Result<UserView> {
        Ok(UserView {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            followers_count: self.followers_count(user.id).await?,
            following_count: self.following_count(user.id).await?,
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserView> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        self.user_view(&user).await
    }

    /// All users ordered by username
    pub async fn list_users(&self) -> Result<Vec<UserView>> {
        let users = self.users.list_users().await?;
        let mut views = Vec::with_capacity(users.len());
        for user in &users {
            views.push(self.user_view(user).await?);
        }
        Ok(views)
    }

    pub async fn post_view(&self, post: &Post) -> Result<PostView> {
        let mut authors = AuthorCache::default();
        self.post_view_with(post, &mut authors).await
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        self.post_view(&post).await
    }

    /// Posts newest first; `author` restricts the list to one user's posts
    pub async fn list_posts(&self, author: Option<Uuid>) -> Result<Vec<PostView>> {
        if let Some(author_id) = author {
            if self.users.get_user(author_id).await?.is_none() {
                return Err(AppError::not_found("User"));
            }
        }

        let posts = self.posts.list_posts(author).await?;
        let mut authors = AuthorCache::default();
        let mut views = Vec::with_capacity(posts.len());
        for post in &posts {
            views.push(self.post_view_with(post, &mut authors).await?);
        }
        Ok(views)
    }

    pub async fn comment_view(&self, comment: &Comment) -> Result<CommentView> {
        let mut authors = AuthorCache::default();
        self.comment_view_with(comment, &mut authors).await
    }

    /// A comment addressed through its post; a comment of another post is not found
    pub async fn get_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<CommentView> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        self.comment_view(&comment).await
    }

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        if self.posts.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        let comments = self.comments_of(post_id).await?;
        let mut authors = AuthorCache::default();
        self.comment_views(&comments, &mut authors).await
    }

    async fn post_view_with(&self, post: &Post, authors: &mut AuthorCache) -> Result<PostView> {
        let author = self.author_view(post.author_id, authors).await?;
        let comments = self.comments_of(post.id).await?;

        Ok(PostView {
            id: post.id,
            author,
            content: post.content.clone(),
            created_at: post.created_at,
            likes_count: self.likes_count(post.id).await?,
            comments: self.comment_views(&comments, authors).await?,
        })
    }

    async fn comment_view_with(
        &self,
        comment: &Comment,
        authors: &mut AuthorCache,
    ) -> Result<CommentView> {
        Ok(CommentView {
            id: comment.id,
            post: comment.post_id,
            author: self.author_view(comment.author_id, authors).await?,
            content: comment.content.clone(),
            created_at: comment.created_at,
        })
    }

    async fn comment_views(
        &self,
        comments: &[Comment],
        authors: &mut AuthorCache,
    ) -> Result<Vec<CommentView>> {
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.comment_view_with(comment, authors).await?);
        }
        Ok(views)
    }

    async fn author_view(&self, author_id: Uuid, authors: &mut AuthorCache) -> Result<UserView> {
        if let Some(view) = authors.get(&author_id) {
            return Ok(view.clone());
        }

        let user = self.users.get_user(author_id).await?.ok_or_else(|| {
            AppError::Internal(format!("author {} missing for existing content", author_id))
        })?;
        let view = self.user_view(&user).await?;
        authors.insert(author_id, view.clone());
        Ok(view)
    }
}

/// Author projections already built while assembling one response
type AuthorCache = HashMap<Uuid, UserView>;
