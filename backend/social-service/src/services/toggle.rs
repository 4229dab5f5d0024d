//! Follow/unfollow and like/unlike as a single toggle operation
//!
//! A toggle is a check-then-act over the relationship store: if the edge
//! exists it is removed, otherwise it is created. The store's uniqueness
//! constraint turns a racing duplicate create into `DuplicateEdge`, and a
//! racing delete shows up as "nothing removed". Either way the attempt is
//! reported as [`Attempt::Raced`] and re-run once against the new state; a
//! second collision surfaces as a retryable [`AppError::Conflict`].

use crate::domain::models::EdgeKind;
use crate::error::{AppError, Result};
use crate::metrics::{TOGGLE_RETRY_TOTAL, TOGGLE_TOTAL};
use crate::repository::{PostStore, RelationshipStore, Store, StoreError, UserStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The edge did not exist and was created
    Created,
    /// The edge existed and was removed
    Removed,
}

impl ToggleOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Created => "created",
            ToggleOutcome::Removed => "removed",
        }
    }
}

/// Result of one check-then-act pass
#[derive(Debug)]
enum Attempt {
    Done(ToggleOutcome),
    /// A concurrent toggle changed the edge between the check and the write
    Raced,
}

#[derive(Clone)]
pub struct ToggleEngine {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    edges: Arc<dyn RelationshipStore>,
}

impl ToggleEngine {
    pub fn new(store: &Store) -> Self {
        Self {
            users: store.users.clone(),
            posts: store.posts.clone(),
            edges: store.edges.clone(),
        }
    }

    /// Follow `target` if `actor` does not follow them yet, unfollow otherwise
    pub async fn toggle_follow(&self, actor: Uuid, target: Uuid) -> Result<ToggleOutcome> {
        if self.users.get_user(target).await?.is_none() {
            return Err(AppError::not_found("User"));
        }
        if actor == target {
            return Err(AppError::SelfActionForbidden(
                "You cannot follow yourself.".to_string(),
            ));
        }

        self.toggle(EdgeKind::Follows, actor, target).await
    }

    /// Like `post` if `actor` has not liked it yet, unlike otherwise.
    /// Authors may like their own posts.
    pub async fn toggle_like(&self, actor: Uuid, post: Uuid) -> Result<ToggleOutcome> {
        if self.posts.get_post(post).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        self.toggle(EdgeKind::Likes, actor, post).await
    }

    async fn toggle(&self, kind: EdgeKind, actor: Uuid, target: Uuid) -> Result<ToggleOutcome> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(kind, actor, target).await? {
                Attempt::Done(outcome) => {
                    TOGGLE_TOTAL
                        .with_label_values(&[kind.as_str(), outcome.as_str()])
                        .inc();
                    info!(
                        relation = %kind,
                        actor = %actor,
                        target = %target,
                        outcome = outcome.as_str(),
                        attempt,
                        "relationship toggled"
                    );
                    return Ok(outcome);
                }
                Attempt::Raced => {
                    warn!(
                        relation = %kind,
                        actor = %actor,
                        target = %target,
                        attempt,
                        "concurrent toggle on the same edge"
                    );
                    if attempt < MAX_ATTEMPTS {
                        TOGGLE_RETRY_TOTAL.with_label_values(&[kind.as_str()]).inc();
                    }
                }
            }
        }

        TOGGLE_TOTAL
            .with_label_values(&[kind.as_str(), "conflict"])
            .inc();
        Err(AppError::Conflict(
            "Concurrent update on the same relationship, please retry.".to_string(),
        ))
    }

    async fn attempt(&self, kind: EdgeKind, actor: Uuid, target: Uuid) -> Result<Attempt> {
        if self.edges.exists(kind, actor, target).await? {
            let removed = self.edges.delete(kind, actor, target).await?;
            return Ok(if removed {
                Attempt::Done(ToggleOutcome::Removed)
            } else {
                Attempt::Raced
            });
        }

        match self.edges.create(kind, actor, target).await {
            Ok(_) => Ok(Attempt::Done(ToggleOutcome::Created)),
            Err(StoreError::DuplicateEdge) => Ok(Attempt::Raced),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EdgeId, NewUser, User};
    use crate::repository::{MemoryStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    async fn user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.to_string(),
                email: String::new(),
                password_hash: crypto_core::UNUSABLE_PASSWORD.to_string(),
            })
            .await
            .unwrap()
    }

    fn engine_over(memory: Arc<MemoryStore>, edges: Arc<dyn RelationshipStore>) -> ToggleEngine {
        let mut store = Store::from_memory(memory);
        store.edges = edges;
        ToggleEngine::new(&store)
    }

    /// Simulates a concurrent request that inserts the edge right before our create
    struct CreateRacesOnce {
        inner: Arc<MemoryStore>,
        raced: AtomicBool,
    }

    #[async_trait]
    impl RelationshipStore for CreateRacesOnce {
        async fn exists(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
            self.inner.exists(kind, source, target).await
        }

        async fn create(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<EdgeId> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner.create(kind, source, target).await?;
            }
            self.inner.create(kind, source, target).await
        }

        async fn delete(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
            self.inner.delete(kind, source, target).await
        }

        async fn count_incoming(&self, kind: EdgeKind, target: Uuid) -> StoreResult<i64> {
            self.inner.count_incoming(kind, target).await
        }

        async fn count_outgoing(&self, kind: EdgeKind, source: Uuid) -> StoreResult<i64> {
            self.inner.count_outgoing(kind, source).await
        }
    }

    /// Every create collides and the edge never becomes visible
    #[derive(Default)]
    struct AlwaysRaces {
        creates: AtomicUsize,
    }

    #[async_trait]
    impl RelationshipStore for AlwaysRaces {
        async fn exists(&self, _: EdgeKind, _: Uuid, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }

        async fn create(&self, _: EdgeKind, _: Uuid, _: Uuid) -> StoreResult<EdgeId> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::DuplicateEdge)
        }

        async fn delete(&self, _: EdgeKind, _: Uuid, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }

        async fn count_incoming(&self, _: EdgeKind, _: Uuid) -> StoreResult<i64> {
            Ok(0)
        }

        async fn count_outgoing(&self, _: EdgeKind, _: Uuid) -> StoreResult<i64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_toggle_follow_twice_restores_edge_set() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let bob = user(&memory, "bob").await;
        let engine = ToggleEngine::new(&Store::from_memory(memory.clone()));

        assert_eq!(
            engine.toggle_follow(bob.id, alice.id).await.unwrap(),
            ToggleOutcome::Created
        );
        assert!(memory.exists(EdgeKind::Follows, bob.id, alice.id).await.unwrap());

        assert_eq!(
            engine.toggle_follow(bob.id, alice.id).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert!(!memory.exists(EdgeKind::Follows, bob.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_is_rejected_without_mutation() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let engine = ToggleEngine::new(&Store::from_memory(memory.clone()));

        let err = engine.toggle_follow(alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::SelfActionForbidden(ref msg) if msg == "You cannot follow yourself."));
        assert_eq!(memory.count_outgoing(EdgeKind::Follows, alice.id).await.unwrap(), 0);
        assert_eq!(memory.count_incoming(EdgeKind::Follows, alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let engine = ToggleEngine::new(&Store::from_memory(memory));

        let err = engine.toggle_follow(alice.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_author_can_like_own_post() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let post = memory.create_post(alice.id, "hello").await.unwrap();
        let engine = ToggleEngine::new(&Store::from_memory(memory.clone()));

        assert_eq!(
            engine.toggle_like(alice.id, post.id).await.unwrap(),
            ToggleOutcome::Created
        );
        assert_eq!(memory.count_incoming(EdgeKind::Likes, post.id).await.unwrap(), 1);

        assert_eq!(
            engine.toggle_like(alice.id, post.id).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert_eq!(memory.count_incoming(EdgeKind::Likes, post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_like_unknown_post_is_not_found() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let engine = ToggleEngine::new(&Store::from_memory(memory));

        let err = engine.toggle_like(alice.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lost_create_race_is_retried_against_new_state() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let bob = user(&memory, "bob").await;
        let racing = Arc::new(CreateRacesOnce {
            inner: memory.clone(),
            raced: AtomicBool::new(false),
        });
        let engine = engine_over(memory.clone(), racing);

        // the concurrent request created the edge, so the retry sees it and removes it
        assert_eq!(
            engine.toggle_follow(bob.id, alice.id).await.unwrap(),
            ToggleOutcome::Removed
        );
        assert!(!memory.exists(EdgeKind::Follows, bob.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_repeated_race_surfaces_conflict_after_one_retry() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let bob = user(&memory, "bob").await;
        let racing = Arc::new(AlwaysRaces::default());
        let engine = engine_over(memory, racing.clone());

        let err = engine.toggle_follow(bob.id, alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(racing.creates.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_edge_set_consistent() {
        let memory = Arc::new(MemoryStore::new());
        let alice = user(&memory, "alice").await;
        let bob = user(&memory, "bob").await;
        let engine = ToggleEngine::new(&Store::from_memory(memory.clone()));

        let results =
            futures::future::join_all((0..8).map(|_| engine.toggle_follow(bob.id, alice.id)))
                .await;

        let mut net = 0i64;
        for result in results {
            match result {
                Ok(ToggleOutcome::Created) => net += 1,
                Ok(ToggleOutcome::Removed) => net -= 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let followers = memory.count_incoming(EdgeKind::Follows, alice.id).await.unwrap();
        assert_eq!(followers, net);
        assert!(followers == 0 || followers == 1);
    }
}
