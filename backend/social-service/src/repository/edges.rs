use super::{classify, RelationshipStore, StoreError, StoreResult};
use crate::domain::models::{EdgeId, EdgeKind};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Table layout backing one edge kind
struct EdgeTable {
    table: &'static str,
    source: &'static str,
    target: &'static str,
    /// Resource name reported when a foreign key is missing
    target_name: &'static str,
}

fn table_for(kind: EdgeKind) -> EdgeTable {
    match kind {
        EdgeKind::Follows => EdgeTable {
            table: "follows",
            source: "follower_id",
            target: "following_id",
            target_name: "User",
        },
        EdgeKind::Likes => EdgeTable {
            table: "likes",
            source: "user_id",
            target: "post_id",
            target_name: "Post",
        },
    }
}

/// Follow and like edges in PostgreSQL
///
/// Uniqueness per (source, target) is enforced by `follows_pair_key` and
/// `likes_pair_key`; a racing insert surfaces as [`StoreError::DuplicateEdge`].
#[derive(Clone)]
pub struct PgRelationshipStore {
    pool: PgPool,
}

impl PgRelationshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipStore for PgRelationshipStore {
    async fn exists(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
        let t = table_for(kind);
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1 AND {} = $2)",
            t.table, t.source, t.target
        );

        let exists: bool = sqlx::query_scalar(&sql)
            .bind(source)
            .bind(target)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<EdgeId> {
        let t = table_for(kind);
        let sql = format!(
            "INSERT INTO {} (id, {}, {}) VALUES ($1, $2, $3) RETURNING id",
            t.table, t.source, t.target
        );

        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(Uuid::new_v4())
            .bind(source)
            .bind(target)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, StoreError::DuplicateEdge, t.target_name))
    }

    async fn delete(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
        let t = table_for(kind);
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            t.table, t.source, t.target
        );

        let result = sqlx::query(&sql)
            .bind(source)
            .bind(target)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_incoming(&self, kind: EdgeKind, target: Uuid) -> StoreResult<i64> {
        let t = table_for(kind);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", t.table, t.target);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(target)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_outgoing(&self, kind: EdgeKind, source: Uuid) -> StoreResult<i64> {
        let t = table_for(kind);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", t.table, t.source);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(source)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
