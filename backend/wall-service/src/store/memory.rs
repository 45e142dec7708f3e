//! In-memory feed store used by tests and storeless development runs.
//!
//! A single `RwLock` over all three collections keeps every mutation
//! atomic with respect to the checks it makes, which is the same
//! guarantee the guarded Postgres statements give per row.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Comment, Post, User};
use crate::store::{FeedStore, PostUpdate, StoreError, UserUpdate};

use async_trait::async_trait;

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

#[derive(Default)]
pub struct MemoryFeedStore {
    inner: RwLock<Collections>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn wall_order(posts: &mut Vec<Post>) {
    posts.sort_by(|a, b| {
        b.likes
            .len()
            .cmp(&a.likes.len())
            .then(a.created_at.cmp(&b.created_at))
    });
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, fields: UserUpdate) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(username) = &fields.username {
            if inner
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(StoreError::Duplicate("username"));
            }
        }
        if let Some(email) = &fields.email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate("email"));
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(username) = fields.username {
            user.username = username;
        }
        if let Some(email) = fields.email {
            user.email = email;
        }
        if let Some(firstname) = fields.firstname {
            user.firstname = firstname;
        }
        if let Some(lastname) = fields.lastname {
            user.lastname = lastname;
        }
        if let Some(password_hash) = fields.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        self.inner.write().await.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner.posts.values().cloned().collect();
        wall_order(&mut posts);
        Ok(posts)
    }

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        wall_order(&mut posts);
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, fields: PostUpdate) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(title) = fields.title {
            post.title = title;
        }
        if let Some(description) = fields.description {
            post.description = description;
        }
        if let Some(location) = fields.location {
            post.location = location;
        }
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.posts.remove(&id).is_some())
    }

    async fn delete_posts_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|_, p| p.owner_id != owner_id);
        Ok((before - inner.posts.len()) as u64)
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        if post.likes.contains(&user_id) {
            return Ok(false);
        }
        post.likes.push(user_id);
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        let before = post.likes.len();
        post.likes.retain(|id| *id != user_id);
        if post.likes.len() == before {
            return Ok(false);
        }
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn pull_like_everywhere(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for post in inner.posts.values_mut() {
            let before = post.likes.len();
            post.likes.retain(|id| *id != user_id);
            if post.likes.len() != before {
                post.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn push_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        if post.comments.contains(&comment_id) {
            return Ok(false);
        }
        post.comments.push(comment_id);
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn pull_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        let before = post.comments.len();
        post.comments.retain(|id| *id != comment_id);
        if post.comments.len() == before {
            return Ok(false);
        }
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn pull_comment_ref_everywhere(&self, comment_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for post in inner.posts.values_mut() {
            let before = post.comments.len();
            post.comments.retain(|id| *id != comment_id);
            if post.comments.len() != before {
                post.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .comments
            .insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        Ok(self.inner.read().await.comments.get(&id).cloned())
    }

    async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.comments.get(id).cloned())
            .collect())
    }

    async fn find_comments_by_owner(&self, owner_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_comment(&self, id: Uuid, description: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(comment) = inner.comments.get_mut(&id) else {
            return Ok(false);
        };
        comment.description = description.to_string();
        comment.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.comments.remove(&id).is_some())
    }

    async fn delete_comments_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.comments.len();
        inner.comments.retain(|_, c| c.owner_id != owner_id);
        Ok((before - inner.comments.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn add_like_is_idempotent() {
        let store = MemoryFeedStore::new();
        let post = sample_post(Uuid::new_v4());
        store.insert_post(&post).await.expect("insert");

        let liker = Uuid::new_v4();
        assert!(store.add_like(post.id, liker).await.expect("first like"));
        assert!(!store.add_like(post.id, liker).await.expect("second like"));

        let stored = store.find_post(post.id).await.expect("find").expect("post");
        assert_eq!(stored.likes, vec![liker]);
    }

    #[tokio::test]
    async fn remove_like_reports_absence() {
        let store = MemoryFeedStore::new();
        let post = sample_post(Uuid::new_v4());
        store.insert_post(&post).await.expect("insert");

        assert!(!store
            .remove_like(post.id, Uuid::new_v4())
            .await
            .expect("remove"));
    }

    #[tokio::test]
    async fn wall_sorts_by_likes_then_age() {
        let store = MemoryFeedStore::new();
        let owner = Uuid::new_v4();

        let mut oldest = sample_post(owner);
        oldest.created_at = Utc::now() - chrono::Duration::hours(2);
        let mut newer = sample_post(owner);
        newer.created_at = Utc::now() - chrono::Duration::hours(1);
        let mut popular = sample_post(owner);
        popular.likes = vec![Uuid::new_v4(), Uuid::new_v4()];

        store.insert_post(&newer).await.expect("insert");
        store.insert_post(&popular).await.expect("insert");
        store.insert_post(&oldest).await.expect("insert");

        let wall = store.list_posts().await.expect("list");
        let ids: Vec<Uuid> = wall.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![popular.id, oldest.id, newer.id]);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryFeedStore::new();
        store
            .insert_user(&sample_user("ada"))
            .await
            .expect("first insert");

        let mut clash = sample_user("ada");
        clash.email = "other@example.com".to_string();
        let err = store.insert_user(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));
    }

    #[tokio::test]
    async fn pull_like_everywhere_counts_changed_posts() {
        let store = MemoryFeedStore::new();
        let liker = Uuid::new_v4();

        let mut liked_a = sample_post(Uuid::new_v4());
        liked_a.likes = vec![liker, Uuid::new_v4()];
        let mut liked_b = sample_post(Uuid::new_v4());
        liked_b.likes = vec![liker];
        let unliked = sample_post(Uuid::new_v4());

        store.insert_post(&liked_a).await.expect("insert");
        store.insert_post(&liked_b).await.expect("insert");
        store.insert_post(&unliked).await.expect("insert");

        let changed = store.pull_like_everywhere(liker).await.expect("pull");
        assert_eq!(changed, 2);

        let a = store
            .find_post(liked_a.id)
            .await
            .expect("find")
            .expect("post");
        assert!(!a.likes.contains(&liker));
        assert_eq!(a.likes.len(), 1);
    }

    #[tokio::test]
    async fn comment_refs_are_pushed_and_pulled() {
        let store = MemoryFeedStore::new();
        let post = sample_post(Uuid::new_v4());
        store.insert_post(&post).await.expect("insert");

        let comment_id = Uuid::new_v4();
        assert!(store
            .push_comment_ref(post.id, comment_id)
            .await
            .expect("push"));
        assert!(!store
            .push_comment_ref(post.id, comment_id)
            .await
            .expect("push again"));

        assert!(store
            .pull_comment_ref(post.id, comment_id)
            .await
            .expect("pull"));
        assert!(!store
            .pull_comment_ref(post.id, comment_id)
            .await
            .expect("pull again"));
    }

    #[tokio::test]
    async fn update_user_checks_for_taken_names() {
        let store = MemoryFeedStore::new();
        let ada = sample_user("ada");
        let ben = sample_user("ben");
        store.insert_user(&ada).await.expect("insert ada");
        store.insert_user(&ben).await.expect("insert ben");

        let err = store
            .update_user(
                ben.id,
                UserUpdate {
                    username: Some("ada".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));

        // Updating your own row to its current username is not a clash.
        assert!(store
            .update_user(
                ada.id,
                UserUpdate {
                    username: Some("ada".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("self update"));
    }

    #[tokio::test]
    async fn delete_by_owner_reports_counts() {
        let store = MemoryFeedStore::new();
        let owner = Uuid::new_v4();

        store
            .insert_post(&sample_post(owner))
            .await
            .expect("insert");
        store
            .insert_post(&sample_post(owner))
            .await
            .expect("insert");
        store
            .insert_post(&sample_post(Uuid::new_v4()))
            .await
            .expect("insert");

        assert_eq!(store.delete_posts_by_owner(owner).await.expect("delete"), 2);
        assert_eq!(store.list_posts().await.expect("list").len(), 1);
    }
}
