//! Feed storage behind an async trait.
//!
//! The service core only ever talks to a [`FeedStore`]; the Postgres
//! implementation backs production and the in-memory one backs tests and
//! storeless development. Array memberships (likes, post->comment refs)
//! change through single guarded operations so concurrent writers cannot
//! lose each other's updates.

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Comment, Post, User};

pub use memory::MemoryFeedStore;
pub use postgres::PgFeedStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Optional replacement fields for a profile update. `None` leaves the
/// stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub password_hash: Option<String>,
}

/// Optional replacement fields for a post edit.
#[derive(Debug, Default, Clone)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Storage contract for users, posts and comments.
///
/// Membership operations (`add_like`, `remove_like`, `push_comment_ref`,
/// `pull_comment_ref`) apply atomically per post and report whether they
/// changed anything: `Ok(false)` means the target row was missing or the
/// membership was already in the requested state. Callers decide what that
/// means for them.
#[async_trait]
pub trait FeedStore: Send + Sync {
    // Users

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Bulk lookup used for hydration; missing ids are silently absent.
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn update_user(&self, id: Uuid, fields: UserUpdate) -> Result<bool, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    // Posts

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    /// All posts in wall order: like count descending, then creation time
    /// ascending.
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;
    /// One user's posts, in the same wall order.
    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>, StoreError>;
    async fn update_post(&self, id: Uuid, fields: PostUpdate) -> Result<bool, StoreError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn delete_posts_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    // Like membership

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;
    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;
    /// Remove `user_id` from every like set it appears in. Returns how
    /// many posts changed.
    async fn pull_like_everywhere(&self, user_id: Uuid) -> Result<u64, StoreError>;

    // Comment references on posts

    async fn push_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError>;
    async fn pull_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError>;
    /// Remove `comment_id` from whichever post references it. Returns how
    /// many posts changed.
    async fn pull_comment_ref_everywhere(&self, comment_id: Uuid) -> Result<u64, StoreError>;

    // Comments

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    /// Bulk lookup used for hydration; missing ids are silently absent.
    async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, StoreError>;
    async fn find_comments_by_owner(&self, owner_id: Uuid) -> Result<Vec<Comment>, StoreError>;
    async fn update_comment(&self, id: Uuid, description: &str) -> Result<bool, StoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn delete_comments_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    // Maintenance

    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
