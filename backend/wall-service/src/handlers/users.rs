/// Account listing, profile and deletion handlers
use actix_web::{delete, get, patch, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::User;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::ProfileChanges;
use crate::AppState;

/// User as returned over the wire. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 256))]
    pub username: Option<String>,
    #[validate(length(min = 3, max = 256))]
    pub firstname: Option<String>,
    #[validate(length(min = 3, max = 256))]
    pub lastname: Option<String>,
    #[validate(email, length(min = 6, max = 256))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 1024))]
    pub password: Option<String>,
}

/// GET /api/user
/// List every account
#[get("/user")]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let users = state.store.list_users().await?;
    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/user/{user_id}
/// Fetch a single account
#[get("/user/{user_id}")]
pub async fn get_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let user = state
        .store
        .find_user(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH /api/user/{user_id}
/// Update the authenticated account's profile
#[patch("/user/{user_id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let updated = state
        .auth
        .update_profile(
            user.0,
            path.into_inner(),
            ProfileChanges {
                username: payload.username,
                firstname: payload.firstname,
                lastname: payload.lastname,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// DELETE /api/user/{user_id}
/// Delete the authenticated account and queue the content cascade
#[delete("/user/{user_id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    state.accounts.delete_account(user.0, path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
