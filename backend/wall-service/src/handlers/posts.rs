/// Wall, post CRUD and like handlers
use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::NewPost;
use crate::store::PostUpdate;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct NewPostRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 256))]
    pub location: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditPostRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub location: Option<String>,
}

/// GET /api/post
/// The wall: every post, most liked first
#[get("/post")]
pub async fn wall(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.engine.wall().await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/post/user-posts/{user_id}
/// One user's slice of the wall
#[get("/post/user-posts/{user_id}")]
pub async fn user_posts(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let posts = state.engine.user_wall(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/post/{post_id}
/// A single post with likes and comments resolved
#[get("/post/{post_id}")]
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let post = state.engine.post_view(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/post/new-post
/// Publish a post owned by the authenticated user
#[post("/post/new-post")]
pub async fn create_post(
    state: web::Data<AppState>,
    user: UserId,
    payload: web::Json<NewPostRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let post = state
        .engine
        .create_post(
            user.0,
            NewPost {
                title: payload.title,
                description: payload.description,
                location: payload.location,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// PATCH /api/post/{post_id}
/// Edit an owned post
#[patch("/post/{post_id}")]
pub async fn edit_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
    payload: web::Json<EditPostRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let post = state
        .engine
        .edit_post(
            path.into_inner(),
            user.0,
            PostUpdate {
                title: payload.title,
                description: payload.description,
                location: payload.location,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/post/{post_id}
/// Delete an owned post
#[delete("/post/{post_id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    state.engine.delete_post(path.into_inner(), user.0).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/post/like-post/{post_id}
/// Like somebody else's post
#[post("/post/like-post/{post_id}")]
pub async fn like_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    let post = state.engine.like(path.into_inner(), user.0).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/post/unlike-post/{post_id}
/// Withdraw a like
#[post("/post/unlike-post/{post_id}")]
pub async fn unlike_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    let post = state.engine.unlike(path.into_inner(), user.0).await?;

    Ok(HttpResponse::Ok().json(post))
}
