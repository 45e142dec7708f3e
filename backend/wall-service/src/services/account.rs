//! Account deletion and the data-cleanup cascade.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::store::{FeedStore, StoreError};

/// Deletes accounts and sweeps their activity out of the feed.
///
/// The account row goes away synchronously; everything else runs as a
/// background cascade. A cascade that fails part-way lands in the
/// pending queue and is retried by [`run_pending`](Self::run_pending),
/// normally driven by the periodic cleanup job.
#[derive(Clone)]
pub struct AccountLifecycle {
    store: Arc<dyn FeedStore>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
}

impl AccountLifecycle {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Delete the account record and schedule the cleanup cascade. The
    /// caller gets an answer as soon as the account row is gone.
    pub async fn delete_account(&self, actor: Uuid, user_id: Uuid) -> Result<()> {
        if actor != user_id {
            return Err(AppError::NotFound("user not found".to_string()));
        }
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        tracing::info!(%user_id, "account deleted, scheduling data cleanup");

        let lifecycle = self.clone();
        tokio::spawn(async move {
            lifecycle.run_cascade(user_id).await;
        });
        Ok(())
    }

    /// Remove every trace of a user's activity. Steps are ordered so
    /// references disappear before the entities they point at, and each
    /// step is idempotent: re-running after a partial failure only
    /// removes whatever is still there.
    pub async fn purge_user_data(&self, user_id: Uuid) -> std::result::Result<(), StoreError> {
        // Unlink the user's comments from every post that references them.
        let comments = self.store.find_comments_by_owner(user_id).await?;
        for comment in &comments {
            self.store.pull_comment_ref_everywhere(comment.id).await?;
        }

        // Withdraw the user's likes.
        self.store.pull_like_everywhere(user_id).await?;

        // Drop the user's posts, then the now-unreferenced comments.
        self.store.delete_posts_by_owner(user_id).await?;
        self.store.delete_comments_by_owner(user_id).await?;

        Ok(())
    }

    /// Retry every queued cleanup once. Returns how many users are still
    /// queued afterwards.
    pub async fn run_pending(&self) -> usize {
        let queued: Vec<Uuid> = self.pending_set().iter().copied().collect();
        for user_id in queued {
            match self.purge_user_data(user_id).await {
                Ok(()) => {
                    self.pending_set().remove(&user_id);
                    tracing::info!(%user_id, "queued account cleanup completed");
                }
                Err(err) => {
                    tracing::warn!(%user_id, error = %err, "queued account cleanup failed again");
                }
            }
        }
        self.pending_count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_set().len()
    }

    async fn run_cascade(&self, user_id: Uuid) {
        match self.purge_user_data(user_id).await {
            Ok(()) => {
                tracing::info!(%user_id, "account data cleanup complete");
            }
            Err(err) => {
                // The account row is already gone; leftover activity is a
                // partial failure that must be retried, not forgotten.
                tracing::error!(
                    %user_id,
                    error = %err,
                    "account data cleanup failed, queued for retry"
                );
                self.pending_set().insert(user_id);
            }
        }
    }

    fn pending_set(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Post, User};
    use crate::store::testing::FaultyStore;
    use crate::store::MemoryFeedStore;
    use chrono::Utc;
    use std::sync::atomic::Ordering;

    fn sample_user(username: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_post(owner_id: Uuid) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            owner_id,
            title: "title".to_string(),
            description: "description".to_string(),
            location: "somewhere".to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_comment(owner_id: Uuid) -> Comment {
        let now = Utc::now();
        Comment {
            id: Uuid::new_v4(),
            owner_id,
            description: "a comment".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed: `leaver` likes and comments on `keeper`'s post, and owns a
    /// post of their own. Returns (keeper's post id, leaver's post id,
    /// leaver's comment id).
    async fn seed_world(store: &dyn FeedStore, keeper: Uuid, leaver: Uuid) -> (Uuid, Uuid, Uuid) {
        let mut keepers_post = sample_post(keeper);
        let leavers_comment = sample_comment(leaver);
        keepers_post.likes.push(leaver);
        keepers_post.comments.push(leavers_comment.id);
        let leavers_post = sample_post(leaver);

        store.insert_post(&keepers_post).await.expect("seed post");
        store.insert_post(&leavers_post).await.expect("seed post");
        store
            .insert_comment(&leavers_comment)
            .await
            .expect("seed comment");

        (keepers_post.id, leavers_post.id, leavers_comment.id)
    }

    #[tokio::test]
    async fn purge_removes_all_traces_and_nothing_else() {
        let store = Arc::new(MemoryFeedStore::new());
        let keeper = Uuid::new_v4();
        let leaver = Uuid::new_v4();
        let (keepers_post, leavers_post, leavers_comment) =
            seed_world(store.as_ref(), keeper, leaver).await;

        let lifecycle = AccountLifecycle::new(store.clone());
        lifecycle.purge_user_data(leaver).await.expect("purge");

        // Keeper's post survives with the leaver's activity stripped.
        let post = store
            .find_post(keepers_post)
            .await
            .expect("find")
            .expect("post");
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());

        // Leaver's own post and comment entity are gone.
        assert!(store.find_post(leavers_post).await.expect("find").is_none());
        assert!(store
            .find_comment(leavers_comment)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn purge_twice_is_harmless() {
        let store = Arc::new(MemoryFeedStore::new());
        let leaver = Uuid::new_v4();
        seed_world(store.as_ref(), Uuid::new_v4(), leaver).await;

        let lifecycle = AccountLifecycle::new(store);
        lifecycle.purge_user_data(leaver).await.expect("first run");
        lifecycle.purge_user_data(leaver).await.expect("second run");
    }

    #[tokio::test]
    async fn delete_account_is_self_scoped() {
        let store = Arc::new(MemoryFeedStore::new());
        let user = sample_user("ada");
        store.insert_user(&user).await.expect("seed user");

        let lifecycle = AccountLifecycle::new(store.clone());
        let err = lifecycle
            .delete_account(Uuid::new_v4(), user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // The account is untouched.
        assert!(store.find_user(user.id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn delete_account_of_missing_user_is_not_found() {
        let store = Arc::new(MemoryFeedStore::new());
        let lifecycle = AccountLifecycle::new(store);
        let ghost = Uuid::new_v4();
        let err = lifecycle.delete_account(ghost, ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_cascade_is_queued_and_retried() {
        let store = Arc::new(FaultyStore::new());
        let leaver = Uuid::new_v4();
        seed_world(&*store, Uuid::new_v4(), leaver).await;

        store.fail_pull_like.store(true, Ordering::SeqCst);

        let lifecycle = AccountLifecycle::new(store.clone());
        assert!(lifecycle.purge_user_data(leaver).await.is_err());
        lifecycle.run_cascade(leaver).await;
        assert_eq!(lifecycle.pending_count(), 1);

        // Still failing: the entry stays queued.
        assert_eq!(lifecycle.run_pending().await, 1);

        // Heal the store and sweep again.
        store.fail_pull_like.store(false, Ordering::SeqCst);
        assert_eq!(lifecycle.run_pending().await, 0);
        assert_eq!(lifecycle.pending_count(), 0);

        // The retry finished the job.
        let leftovers = store
            .find_comments_by_owner(leaver)
            .await
            .expect("scan comments");
        assert!(leftovers.is_empty());
        assert!(store
            .list_posts_by_owner(leaver)
            .await
            .expect("scan posts")
            .is_empty());
    }
}
