use super::{classify, CommentStore, StoreError, StoreResult};
use crate::domain::models::Comment;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Comment rows
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, StoreError::UniqueViolation("id"), "Post"))
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2
            WHERE id = $1
            RETURNING id, post_id, author_id, content, created_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
