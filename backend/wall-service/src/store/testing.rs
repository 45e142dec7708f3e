//! Fault-injecting store used by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::domain::{Comment, Post, User};
use crate::store::{FeedStore, MemoryFeedStore, PostUpdate, StoreError, UserUpdate};

use async_trait::async_trait;

/// Wraps a [`MemoryFeedStore`] and fails selected operations on demand,
/// standing in for a backend that drops out mid-flow. Flipping a flag
/// back to `false` "heals" the fault.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryFeedStore,
    pub fail_push_comment_ref: AtomicBool,
    pub fail_delete_comment: AtomicBool,
    pub fail_pull_like: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn broken() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }
}

#[async_trait]
impl FeedStore for FaultyStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.insert_user(user).await
    }
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.inner.find_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_username(username).await
    }
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        self.inner.find_users(ids).await
    }
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.inner.list_users().await
    }
    async fn update_user(&self, id: Uuid, fields: UserUpdate) -> Result<bool, StoreError> {
        self.inner.update_user(id, fields).await
    }
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_user(id).await
    }
    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        self.inner.insert_post(post).await
    }
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.inner.find_post(id).await
    }
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        self.inner.list_posts().await
    }
    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>, StoreError> {
        self.inner.list_posts_by_owner(owner_id).await
    }
    async fn update_post(&self, id: Uuid, fields: PostUpdate) -> Result<bool, StoreError> {
        self.inner.update_post(id, fields).await
    }
    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_post(id).await
    }
    async fn delete_posts_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        self.inner.delete_posts_by_owner(owner_id).await
    }
    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        self.inner.add_like(post_id, user_id).await
    }
    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        self.inner.remove_like(post_id, user_id).await
    }
    async fn pull_like_everywhere(&self, user_id: Uuid) -> Result<u64, StoreError> {
        if self.fail_pull_like.load(Ordering::SeqCst) {
            return Err(Self::broken());
        }
        self.inner.pull_like_everywhere(user_id).await
    }
    async fn push_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        if self.fail_push_comment_ref.load(Ordering::SeqCst) {
            return Err(Self::broken());
        }
        self.inner.push_comment_ref(post_id, comment_id).await
    }
    async fn pull_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        self.inner.pull_comment_ref(post_id, comment_id).await
    }
    async fn pull_comment_ref_everywhere(&self, comment_id: Uuid) -> Result<u64, StoreError> {
        self.inner.pull_comment_ref_everywhere(comment_id).await
    }
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.inner.insert_comment(comment).await
    }
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.inner.find_comment(id).await
    }
    async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, StoreError> {
        self.inner.find_comments(ids).await
    }
    async fn find_comments_by_owner(&self, owner_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        self.inner.find_comments_by_owner(owner_id).await
    }
    async fn update_comment(&self, id: Uuid, description: &str) -> Result<bool, StoreError> {
        self.inner.update_comment(id, description).await
    }
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        if self.fail_delete_comment.load(Ordering::SeqCst) {
            return Err(Self::broken());
        }
        self.inner.delete_comment(id).await
    }
    async fn delete_comments_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        self.inner.delete_comments_by_owner(owner_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}
