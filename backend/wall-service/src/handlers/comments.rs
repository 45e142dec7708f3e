/// Comment handlers
use actix_web::{delete, patch, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Comment, PostView};
use crate::error::Result;
use crate::middleware::UserId;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CommentWithPostResponse {
    pub post: PostView,
    pub comment: Comment,
}

/// POST /api/post/add-comment/{post_id}
/// Comment on somebody else's post
#[post("/post/add-comment/{post_id}")]
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: UserId,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let (post, comment) = state
        .engine
        .add_comment(path.into_inner(), user.0, &payload.description)
        .await?;

    Ok(HttpResponse::Created().json(CommentWithPostResponse { post, comment }))
}

/// PATCH /api/post/edit-comment/{post_id}/{comment_id}
/// Edit an owned comment
#[patch("/post/edit-comment/{post_id}/{comment_id}")]
pub async fn edit_comment(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    user: UserId,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let (_post_id, comment_id) = path.into_inner();
    let comment = state
        .engine
        .edit_comment(comment_id, user.0, &payload.description)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /api/post/delete-comment/{post_id}/{comment_id}
/// Delete an owned comment and unlink it from its post
#[delete("/post/delete-comment/{post_id}/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    user: UserId,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .engine
        .delete_comment(post_id, comment_id, user.0)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
