//! In-process store for `STORAGE_BACKEND=memory` and tests
//!
//! Mirrors the PostgreSQL schema's constraints: unique usernames, unique edge
//! pairs, foreign keys checked on insert, cascading deletes.

use super::{
    CommentStore, PostStore, RelationshipStore, StoreError, StoreResult, UserStore,
};
use crate::domain::models::{Comment, EdgeId, EdgeKind, NewUser, Post, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    // Vecs keep insertion order, which breaks created_at ties
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    edges: HashMap<(EdgeKind, Uuid, Uuid), EdgeId>,
}

impl State {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn post_exists(&self, id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == id)
    }

    fn remove_post_cascade(&mut self, post_id: Uuid) {
        self.posts.retain(|p| p.id != post_id);
        self.comments.retain(|c| c.post_id != post_id);
        self.edges
            .retain(|(kind, _, target), _| !(*kind == EdgeKind::Likes && *target == post_id));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::UniqueViolation("username"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.users.iter().any(|u| u.username == username))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users = state.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        if let Some(username) = &changes.username {
            if state
                .users
                .iter()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(StoreError::UniqueViolation("username"));
            }
        }

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.user_exists(id) {
            return Ok(false);
        }

        let owned_posts: Vec<Uuid> = state
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            state.remove_post_cascade(post_id);
        }

        state.comments.retain(|c| c.author_id != id);
        state.edges.retain(|(kind, source, target), _| {
            *source != id && !(*kind == EdgeKind::Follows && *target == id)
        });
        state.users.retain(|u| u.id != id);
        Ok(true)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, author_id: Uuid, content: &str) -> StoreResult<Post> {
        let mut state = self.state.write().await;
        if !state.user_exists(author_id) {
            return Err(StoreError::MissingReference("User"));
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, author_id: Option<Uuid>) -> StoreResult<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .rev()
            .filter(|p| author_id.map_or(true, |author| p.author_id == author))
            .cloned()
            .collect();
        // stable: equal timestamps stay newest-inserted first
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, content: &str) -> StoreResult<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.content = content.to_string();
            post.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.post_exists(id) {
            return Ok(false);
        }
        state.remove_post_cascade(id);
        Ok(true)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<Comment> {
        let mut state = self.state.write().await;
        if !state.post_exists(post_id) {
            return Err(StoreError::MissingReference("Post"));
        }
        if !state.user_exists(author_id) {
            return Err(StoreError::MissingReference("User"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.content = content.to_string();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() < before)
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn exists(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.edges.contains_key(&(kind, source, target)))
    }

    async fn create(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<EdgeId> {
        let mut state = self.state.write().await;
        if !state.user_exists(source) {
            return Err(StoreError::MissingReference("User"));
        }
        match kind {
            EdgeKind::Follows if !state.user_exists(target) => {
                return Err(StoreError::MissingReference("User"))
            }
            EdgeKind::Likes if !state.post_exists(target) => {
                return Err(StoreError::MissingReference("Post"))
            }
            _ => {}
        }

        let key = (kind, source, target);
        if state.edges.contains_key(&key) {
            return Err(StoreError::DuplicateEdge);
        }
        let id = Uuid::new_v4();
        state.edges.insert(key, id);
        Ok(id)
    }

    async fn delete(&self, kind: EdgeKind, source: Uuid, target: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.edges.remove(&(kind, source, target)).is_some())
    }

    async fn count_incoming(&self, kind: EdgeKind, target: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        let count = state
            .edges
            .keys()
            .filter(|(k, _, t)| *k == kind && *t == target)
            .count();
        Ok(count as i64)
    }

    async fn count_outgoing(&self, kind: EdgeKind, source: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        let count = state
            .edges
            .keys()
            .filter(|(k, s, _)| *k == kind && *s == source)
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: String::new(),
            password_hash: crypto_core::UNUSABLE_PASSWORD.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let err = store.create_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("username")));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edge_create_is_unique_per_pair() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        store.create(EdgeKind::Follows, bob.id, alice.id).await.unwrap();
        let err = store
            .create(EdgeKind::Follows, bob.id, alice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEdge));

        assert_eq!(store.count_incoming(EdgeKind::Follows, alice.id).await.unwrap(), 1);
        assert_eq!(store.count_outgoing(EdgeKind::Follows, bob.id).await.unwrap(), 1);

        assert!(store.delete(EdgeKind::Follows, bob.id, alice.id).await.unwrap());
        assert!(!store.delete(EdgeKind::Follows, bob.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_requires_existing_post() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();

        let err = store
            .create(EdgeKind::Likes, alice.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("Post")));
    }

    #[tokio::test]
    async fn test_list_orderings() {
        let store = MemoryStore::new();
        store.create_user(new_user("carol")).await.unwrap();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        store.create_user(new_user("bob")).await.unwrap();

        let names: Vec<String> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        let first = store.create_post(alice.id, "first").await.unwrap();
        let second = store.create_post(alice.id, "second").await.unwrap();
        let posts = store.list_posts(None).await.unwrap();
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);

        let c1 = store.create_comment(first.id, alice.id, "one").await.unwrap();
        let c2 = store.create_comment(first.id, alice.id, "two").await.unwrap();
        let comments = store.comments_for_post(first.id).await.unwrap();
        assert_eq!(
            comments.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![c1.id, c2.id]
        );
        assert!(store.comments_for_post(second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        let post = store.create_post(alice.id, "hello").await.unwrap();
        let bob_post = store.create_post(bob.id, "hi").await.unwrap();
        store.create_comment(post.id, bob.id, "nice").await.unwrap();
        store.create_comment(bob_post.id, alice.id, "thanks").await.unwrap();
        store.create(EdgeKind::Likes, bob.id, post.id).await.unwrap();
        store.create(EdgeKind::Follows, bob.id, alice.id).await.unwrap();
        store.create(EdgeKind::Follows, alice.id, bob.id).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());

        assert!(store.get_post(post.id).await.unwrap().is_none());
        assert!(store.comments_for_post(bob_post.id).await.unwrap().is_empty());
        assert_eq!(store.count_outgoing(EdgeKind::Follows, bob.id).await.unwrap(), 0);
        assert_eq!(store.count_incoming(EdgeKind::Follows, bob.id).await.unwrap(), 0);
        assert_eq!(store.count_outgoing(EdgeKind::Likes, bob.id).await.unwrap(), 0);
        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_username() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        store.create_user(new_user("bob")).await.unwrap();

        let err = store
            .update_user(
                alice.id,
                UserChanges {
                    username: Some("bob".into()),
                    email: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("username")));

        let updated = store
            .update_user(
                alice.id,
                UserChanges {
                    username: None,
                    email: Some("alice@example.com".into()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@example.com");
    }
}
