//! Postgres-backed feed store.
//!
//! Likes and comment refs are UUID array columns on `posts`. Membership
//! updates run as single guarded UPDATE statements (`@>` containment in
//! the WHERE clause), so two concurrent writers can never re-add or
//! double-remove the same element.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Comment, Post, User};
use crate::store::{FeedStore, PostUpdate, StoreError, UserUpdate};

use async_trait::async_trait;

pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate unique-index violations into `Duplicate` so callers can tell
/// a taken username/email apart from infrastructure failure.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or_default();
            if constraint.contains("username") {
                return StoreError::Duplicate("username");
            }
            if constraint.contains("email") {
                return StoreError::Duplicate("email");
            }
            return StoreError::Duplicate("key");
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, firstname, lastname, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, firstname, lastname, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, firstname, lastname, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, firstname, lastname, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, firstname, lastname, password_hash, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, firstname, lastname, password_hash, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_user(&self, id: Uuid, fields: UserUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                firstname = COALESCE($4, firstname),
                lastname = COALESCE($5, lastname),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.username)
        .bind(fields.email)
        .bind(fields.firstname)
        .bind(fields.lastname)
        .bind(fields.password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, owner_id, title, description, location, likes, comments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(post.id)
        .bind(post.owner_id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.location)
        .bind(&post.likes)
        .bind(&post.comments)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, title, description, location, likes, comments, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, title, description, location, likes, comments, created_at, updated_at
            FROM posts
            ORDER BY cardinality(likes) DESC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, title, description, location, likes, comments, created_at, updated_at
            FROM posts
            WHERE owner_id = $1
            ORDER BY cardinality(likes) DESC, created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, fields: PostUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.location)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_posts_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = array_append(likes, $2), updated_at = NOW()
            WHERE id = $1 AND NOT (likes @> ARRAY[$2])
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = array_remove(likes, $2), updated_at = NOW()
            WHERE id = $1 AND likes @> ARRAY[$2]
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_like_everywhere(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = array_remove(likes, $1), updated_at = NOW()
            WHERE likes @> ARRAY[$1]
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn push_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET comments = array_append(comments, $2), updated_at = NOW()
            WHERE id = $1 AND NOT (comments @> ARRAY[$2])
            "#,
        )
        .bind(post_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_comment_ref(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET comments = array_remove(comments, $2), updated_at = NOW()
            WHERE id = $1 AND comments @> ARRAY[$2]
            "#,
        )
        .bind(post_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_comment_ref_everywhere(&self, comment_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET comments = array_remove(comments, $1), updated_at = NOW()
            WHERE comments @> ARRAY[$1]
            "#,
        )
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, owner_id, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(comment.owner_id)
        .bind(&comment.description)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, owner_id, description, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, owner_id, description, created_at, updated_at
            FROM comments
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn find_comments_by_owner(&self, owner_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, owner_id, description, created_at, updated_at
            FROM comments
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, description: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET description = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(description)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
