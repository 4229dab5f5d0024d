use super::{classify, PostStore, StoreError, StoreResult};
use crate::domain::models::Post;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Post rows
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create_post(&self, author_id: Uuid, content: &str) -> StoreResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, StoreError::UniqueViolation("id"), "User"))
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, author_id, content, created_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, created_at
            FROM posts
            WHERE $1::uuid IS NULL OR author_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, content: &str) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = $2
            WHERE id = $1
            RETURNING id, author_id, content, created_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
