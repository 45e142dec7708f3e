/// Registration and session handlers
use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::handlers::users::UserResponse;
use crate::middleware::UserId;
use crate::services::NewUser;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 256))]
    pub username: String,
    #[validate(length(min = 3, max = 256))]
    pub firstname: String,
    #[validate(length(min = 3, max = 256))]
    pub lastname: String,
    #[validate(email, length(min = 6, max = 256))]
    pub email: String,
    #[validate(length(min = 6, max = 1024))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email, length(min = 6, max = 256))]
    pub email: String,
    #[validate(length(min = 6, max = 1024))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/user/register
/// Create an account
#[post("/user/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let user = state
        .auth
        .register(NewUser {
            username: payload.username,
            firstname: payload.firstname,
            lastname: payload.lastname,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/user/login
/// Check credentials and hand out a token
#[post("/user/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let (user, token) = state.auth.login(&payload.email, &payload.password).await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.validity_secs(),
        user_id: user.id,
    }))
}

/// POST /api/user/{user_id}/re-auth
/// Issue a fresh token for the authenticated account
#[post("/user/{user_id}/re-auth")]
pub async fn re_auth(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    let token = state.auth.re_auth(user.0, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.validity_secs(),
        user_id: user.0,
    }))
}

/// POST /api/user/{user_id}/logout
/// Revoke the presented token
#[post("/user/{user_id}/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
    http_req: HttpRequest,
) -> Result<HttpResponse> {
    let token = bearer_token(&http_req)?;
    state
        .auth
        .logout(user.0, path.into_inner(), token)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "successfully logged out".to_string(),
    }))
}

fn bearer_token(req: &HttpRequest) -> Result<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)
}
