//! Registration, login and profile management.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::User;
use crate::error::{AppError, Result};
use crate::security::{password, TokenService};
use crate::store::{FeedStore, UserUpdate};

/// Registration payload, already validated at the edge.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

/// Profile update payload; `None` leaves a field unchanged. A new
/// password arrives in plaintext and is hashed here.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn FeedStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<dyn FeedStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let email = new_user.email.to_lowercase();

        // Friendly pre-checks; the store's unique indexes still win races.
        if self
            .store
            .find_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("username already taken".to_string()));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        let password_hash = password::hash_password(&new_user.password)?;

        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email,
            firstname: new_user.firstname,
            lastname: new_user.lastname,
            password_hash,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a fresh token.
    ///
    /// An unknown email and a wrong password answer identically so the
    /// endpoint cannot be used to probe which addresses have accounts.
    pub async fn login(&self, email: &str, password_plain: &str) -> Result<(User, String)> {
        let email = email.to_lowercase();

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify_password(password_plain, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Issue a fresh token for an already-authenticated caller.
    pub async fn re_auth(&self, actor: Uuid, user_id: Uuid) -> Result<String> {
        self.require_self(actor, user_id).await?;
        let token = self.tokens.issue(user_id)?;

        tracing::info!(user_id = %user_id, "token refreshed");
        Ok(token)
    }

    /// Revoke the presented token.
    pub async fn logout(&self, actor: Uuid, user_id: Uuid, token: &str) -> Result<()> {
        self.require_self(actor, user_id).await?;
        self.tokens.invalidate(token);

        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        actor: Uuid,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User> {
        self.require_self(actor, user_id).await?;

        if let Some(username) = &changes.username {
            if let Some(existing) = self.store.find_user_by_username(username).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("username already taken".to_string()));
                }
            }
        }

        let email = changes.email.map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("user already exists".to_string()));
                }
            }
        }

        let password_hash = match changes.password {
            Some(plain) => Some(password::hash_password(&plain)?),
            None => None,
        };

        let fields = UserUpdate {
            username: changes.username,
            email,
            firstname: changes.firstname,
            lastname: changes.lastname,
            password_hash,
        };
        if !self.store.update_user(user_id, fields).await? {
            return Err(AppError::NotFound("user not found".to_string()));
        }

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        tracing::info!(user_id = %user_id, "profile updated");
        Ok(user)
    }

    /// Self-scoped operations answer not-found for foreign ids, the same
    /// as for ids that do not exist at all.
    async fn require_self(&self, actor: Uuid, user_id: Uuid) -> Result<User> {
        if actor != user_id {
            return Err(AppError::NotFound("user not found".to_string()));
        }
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }
}
