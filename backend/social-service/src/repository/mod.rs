//! Persistence seams for social-service
//!
//! Each store is an async trait with a PostgreSQL implementation (source of
//! truth in production) and an in-process [`MemoryStore`] used for local
//! development and tests. Handlers never talk to sqlx directly; they receive a
//! [`Store`] bundle of trait objects.

pub mod comments;
pub mod edges;
pub mod memory;
pub mod posts;
pub mod users;

use crate::domain::{Comment, EdgeId, EdgeKind, NewUser, Post, User, UserChanges};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use comments::PgCommentStore;
pub use edges::PgRelationshipStore;
pub use memory::MemoryStore;
pub use posts::PgPostStore;
pub use users::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The (source, target) pair already has an edge of this kind
    #[error("edge already exists")]
    DuplicateEdge,

    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("referenced row does not exist: {0}")]
    MissingReference(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map constraint failures to typed errors; everything else stays a database error
pub(crate) fn classify(
    err: sqlx::Error,
    unique: StoreError,
    foreign_key: &'static str,
) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned());

    match code.as_deref() {
        Some(PG_UNIQUE_VIOLATION) => unique,
        Some(PG_FOREIGN_KEY_VIOLATION) => StoreError::MissingReference(foreign_key),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueViolation("username")` when the username is taken
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    /// All users ordered by username
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Removes the user and, by cascade, their posts, comments and edges
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, author_id: Uuid, content: &str) -> StoreResult<Post>;

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    /// Newest first, optionally restricted to one author
    async fn list_posts(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Post>>;

    async fn update_post(&self, id: Uuid, content: &str) -> StoreResult<Option<Post>>;

    /// Removes the post and, by cascade, its comments and likes
    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<Comment>;

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    /// Comments of one post, oldest first
    async fn comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>>;

    async fn update_comment(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;
}

/// Directed, unique-per-pair edges for follows (user -> user) and likes (user -> post)
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn exists(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool>;

    /// Fails with [`StoreError::DuplicateEdge`] if the pair is already present
    async fn create(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<EdgeId>;

    /// `true` if an edge was removed, `false` if there was none
    async fn delete(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool>;

    /// Number of edges of `kind` pointing at `target`
    async fn count_incoming(&self, kind: EdgeKind, target: Uuid) -> StoreResult<i64>;

    /// Number of edges of `kind` leaving `source`
    async fn count_outgoing(&self, kind: EdgeKind, source: Uuid) -> StoreResult<i64>;
}

/// Store handles shared by every request
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    pub edges: Arc<dyn RelationshipStore>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool.clone())),
            edges: Arc::new(PgRelationshipStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(memory: Arc<MemoryStore>) -> Self {
        Self {
            users: memory.clone(),
            posts: memory.clone(),
            comments: memory.clone(),
            edges: memory,
        }
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        self.users.health_check().await
    }
}
