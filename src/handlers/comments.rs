/// Comment handlers - HTTP endpoints for thread listing and comment
/// lifecycle operations.
///
/// The same handler set is mounted once per parent entity kind; each scope
/// carries its own `CommentService` via `web::Data`, so the path decides
/// which parent-entity store the mutation side effects hit.
use crate::domain::models::VotePolarity;
use crate::error::{AppError, Result};
use crate::middleware::{MaybeUserId, UserId};
use crate::services::tree::PageParams;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

/// Request body for updating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Query parameters for the per-author listing
#[derive(Debug, Deserialize)]
pub struct AuthorCommentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub parent_entity_id: Option<Uuid>,
}

/// List one page of a thread. Anonymous reads are fine; a known viewer
/// additionally gets their own vote annotated per comment.
pub async fn list_thread(
    service: web::Data<CommentService>,
    parent_entity_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
    viewer: MaybeUserId,
) -> Result<HttpResponse> {
    let page = service
        .list_thread(*parent_entity_id, *query, viewer.0)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Create a comment (root or reply) under a parent entity
pub async fn create_comment(
    service: web::Data<CommentService>,
    parent_entity_id: web::Path<Uuid>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = service
        .create(user_id.0, *parent_entity_id, &req.content, req.parent_comment_id)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Update a comment's content (author only)
pub async fn update_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = service.update(user_id.0, *comment_id, &req.content).await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// Delete a comment (author only; soft or hard per the reply rule)
pub async fn delete_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    service.delete(user_id.0, *comment_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Upvote a comment
pub async fn upvote_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    service
        .vote(user_id.0, *comment_id, VotePolarity::Upvote)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Downvote a comment
pub async fn downvote_comment(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    service
        .vote(user_id.0, *comment_id, VotePolarity::Downvote)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Retract the caller's vote on a comment
pub async fn remove_vote(
    service: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    service.remove_vote(user_id.0, *comment_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Flat listing of one author's comments, newest first
pub async fn get_author_comments(
    service: web::Data<CommentService>,
    author_id: web::Path<Uuid>,
    query: web::Query<AuthorCommentsQuery>,
    viewer: MaybeUserId,
) -> Result<HttpResponse> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let page = service
        .list_by_author(*author_id, query.parent_entity_id, params, viewer.0)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
