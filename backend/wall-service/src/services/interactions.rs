//! Feed mutations: posts, likes and comments.
//!
//! Every operation takes the acting user explicitly, re-reads current
//! state, asks the policy module for a decision, then applies a guarded
//! store operation. The guarded write is what makes concurrent actors
//! safe; the policy check only exists to produce a precise refusal.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Comment, CommentView, Post, PostView, UserSummary};
use crate::error::{AppError, Result};
use crate::policy::{self, Decision, InteractionKind};
use crate::store::{FeedStore, PostUpdate};

const NOT_POST_OWNER: &str = "you are not the owner of the post";
const NOT_COMMENT_OWNER: &str = "you are not the owner of the comment";
const NOT_LIKED: &str = "not liked";

/// New post payload, validated at the edge.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub location: String,
}

#[derive(Clone)]
pub struct InteractionEngine {
    store: Arc<dyn FeedStore>,
}

impl InteractionEngine {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    /// The whole wall, most-liked first, hydrated for rendering.
    pub async fn wall(&self) -> Result<Vec<PostView>> {
        let posts = self.store.list_posts().await?;
        self.hydrate(posts).await
    }

    pub async fn post_view(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.require_post(post_id).await?;
        self.hydrate_one(post).await
    }

    /// One user's posts in wall order.
    pub async fn user_wall(&self, owner_id: Uuid) -> Result<Vec<PostView>> {
        let posts = self.store.list_posts_by_owner(owner_id).await?;
        self.hydrate(posts).await
    }

    pub async fn create_post(&self, actor: Uuid, new_post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            owner_id: actor,
            title: new_post.title,
            description: new_post.description,
            location: new_post.location,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, owner_id = %actor, "post created");
        Ok(post)
    }

    pub async fn edit_post(&self, post_id: Uuid, actor: Uuid, fields: PostUpdate) -> Result<Post> {
        let post = self.require_post(post_id).await?;
        if !policy::can_modify(actor, post.owner_id) {
            return Err(AppError::Forbidden(NOT_POST_OWNER.to_string()));
        }

        if !self.store.update_post(post_id, fields).await? {
            return Err(AppError::NotFound("post not found".to_string()));
        }

        tracing::info!(%post_id, "post edited");
        self.require_post(post_id).await
    }

    pub async fn delete_post(&self, post_id: Uuid, actor: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        if !policy::can_modify(actor, post.owner_id) {
            return Err(AppError::Forbidden(NOT_POST_OWNER.to_string()));
        }

        if !self.store.delete_post(post_id).await? {
            return Err(AppError::NotFound("post not found".to_string()));
        }

        // Comment entities under the post are left in place; they only
        // disappear when their owner's account is purged.
        if !post.comments.is_empty() {
            tracing::warn!(
                %post_id,
                orphaned = post.comments.len(),
                "deleted post leaves unreachable comments"
            );
        }

        tracing::info!(%post_id, "post deleted");
        Ok(())
    }

    pub async fn like(&self, post_id: Uuid, actor: Uuid) -> Result<PostView> {
        let post = self.require_post(post_id).await?;
        if let Decision::Denied { reason } =
            policy::can_interact(actor, &post, InteractionKind::Like)
        {
            return Err(AppError::Forbidden(reason.to_string()));
        }

        if !self.store.add_like(post_id, actor).await? {
            // Lost a race against an identical like.
            return Err(AppError::Forbidden(policy::ALREADY_LIKED.to_string()));
        }

        tracing::info!(%post_id, user_id = %actor, "post liked");
        let post = self.require_post(post_id).await?;
        self.hydrate_one(post).await
    }

    pub async fn unlike(&self, post_id: Uuid, actor: Uuid) -> Result<PostView> {
        let post = self.require_post(post_id).await?;
        if !post.likes.contains(&actor) {
            return Err(AppError::NotFound(NOT_LIKED.to_string()));
        }

        if !self.store.remove_like(post_id, actor).await? {
            // The like vanished between the read and the write.
            return Err(AppError::NotFound(NOT_LIKED.to_string()));
        }

        tracing::info!(%post_id, user_id = %actor, "post unliked");
        let post = self.require_post(post_id).await?;
        self.hydrate_one(post).await
    }

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        actor: Uuid,
        description: &str,
    ) -> Result<(PostView, Comment)> {
        let post = self.require_post(post_id).await?;
        if let Decision::Denied { reason } =
            policy::can_interact(actor, &post, InteractionKind::Comment)
        {
            return Err(AppError::Forbidden(reason.to_string()));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            owner_id: actor,
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(&comment).await?;

        // Entity first, then the reference, so the wall never points at a
        // comment that does not exist. If the link write fails the fresh
        // entity is discarded again.
        let linked = match self.store.push_comment_ref(post_id, comment.id).await {
            Ok(linked) => linked,
            Err(err) => {
                self.discard_orphan(comment.id).await?;
                return Err(err.into());
            }
        };
        if !linked {
            // The post vanished between the policy read and the link.
            self.discard_orphan(comment.id).await?;
            return Err(AppError::NotFound("post not found".to_string()));
        }

        tracing::info!(%post_id, comment_id = %comment.id, user_id = %actor, "comment added");
        let post = self.require_post(post_id).await?;
        Ok((self.hydrate_one(post).await?, comment))
    }

    pub async fn edit_comment(
        &self,
        comment_id: Uuid,
        actor: Uuid,
        description: &str,
    ) -> Result<Comment> {
        self.require_owned_comment(comment_id, actor).await?;

        if !self.store.update_comment(comment_id, description).await? {
            return Err(AppError::Forbidden(NOT_COMMENT_OWNER.to_string()));
        }

        tracing::info!(%comment_id, "comment edited");
        self.store
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::Forbidden(NOT_COMMENT_OWNER.to_string()))
    }

    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid, actor: Uuid) -> Result<()> {
        self.require_owned_comment(comment_id, actor).await?;

        // Reference first, then the entity; a half-finished delete must
        // never leave the wall pointing at a missing comment.
        if !self.store.pull_comment_ref(post_id, comment_id).await? {
            return Err(AppError::NotFound("comment not on this post".to_string()));
        }
        self.store.delete_comment(comment_id).await?;

        tracing::info!(%post_id, %comment_id, "comment deleted");
        Ok(())
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("post not found".to_string()))
    }

    /// Look up a comment the actor must own. Missing comments get the
    /// same refusal as foreign ones so the endpoint does not leak which
    /// comment ids exist.
    async fn require_owned_comment(&self, comment_id: Uuid, actor: Uuid) -> Result<Comment> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::Forbidden(NOT_COMMENT_OWNER.to_string()))?;
        if !policy::can_modify(actor, comment.owner_id) {
            return Err(AppError::Forbidden(NOT_COMMENT_OWNER.to_string()));
        }
        Ok(comment)
    }

    /// Remove a comment entity that never got linked. Failing to remove
    /// it leaves storage inconsistent, which is loud, not silent.
    async fn discard_orphan(&self, comment_id: Uuid) -> Result<()> {
        if let Err(err) = self.store.delete_comment(comment_id).await {
            tracing::error!(%comment_id, error = %err, "failed to discard orphaned comment");
            return Err(AppError::PartialFailure(format!(
                "comment {} created but never linked",
                comment_id
            )));
        }
        Ok(())
    }

    async fn hydrate_one(&self, post: Post) -> Result<PostView> {
        let mut views = self.hydrate(vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("hydration dropped a post".to_string()))
    }

    /// Resolve like sets and comment refs against the user and comment
    /// tables in two batched lookups. References that no longer resolve
    /// are skipped rather than rendered half-empty.
    async fn hydrate(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let mut comment_ids: Vec<Uuid> = Vec::new();
        for post in &posts {
            comment_ids.extend(&post.comments);
        }
        let comments = self.store.find_comments(&comment_ids).await?;

        let mut user_ids: Vec<Uuid> = posts
            .iter()
            .flat_map(|post| post.likes.iter().copied())
            .collect();
        user_ids.extend(comments.iter().map(|comment| comment.owner_id));
        user_ids.sort_unstable();
        user_ids.dedup();
        let users = self.store.find_users(&user_ids).await?;

        let usernames: HashMap<Uuid, String> = users
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();
        let by_id: HashMap<Uuid, Comment> = comments
            .into_iter()
            .map(|comment| (comment.id, comment))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let likes = post
                    .likes
                    .iter()
                    .filter_map(|id| {
                        usernames.get(id).map(|username| UserSummary {
                            id: *id,
                            username: username.clone(),
                        })
                    })
                    .collect();
                let comment_views = post
                    .comments
                    .iter()
                    .filter_map(|id| by_id.get(id))
                    .map(|comment| CommentView {
                        id: comment.id,
                        owner: usernames.get(&comment.owner_id).map(|username| UserSummary {
                            id: comment.owner_id,
                            username: username.clone(),
                        }),
                        description: comment.description.clone(),
                    })
                    .collect();

                PostView {
                    id: post.id,
                    owner_id: post.owner_id,
                    title: post.title,
                    description: post.description,
                    location: post.location,
                    likes,
                    comments: comment_views,
                    created_at: post.created_at,
                    updated_at: post.updated_at,
                }
            })
            .collect())
    }
}
