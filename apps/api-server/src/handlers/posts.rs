//! Post handlers: index listing, detail, create, edit, delete.
//!
//! Visibility is decided by `blogicum_core::policy`; a post the viewer may
//! not see answers 404, and a mutation by a non-owner answers with a
//! redirect to the post's detail resource, leaving the post untouched.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blogicum_core::domain::Post;
use blogicum_core::policy;
use blogicum_shared::dto::{CreatePostRequest, PostDetailResponse, UpdatePostRequest};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{
    PageQuery, comment_response, index_path, page_response, post_detail_path, profile_path,
    see_other,
};

fn hidden_or_missing() -> AppError {
    // One surface for "absent" and "exists but not for this viewer".
    AppError::NotFound("Post not found".to_string())
}

fn validate_fields(title: &str, text: &str) -> AppResult<()> {
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push("Title must not be empty".to_string());
    }
    if title.chars().count() > 256 {
        errors.push("Title must be at most 256 characters".to_string());
    }
    if text.is_empty() {
        errors.push("Text must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn validate_relations(
    state: &AppState,
    category_id: Option<Uuid>,
    location_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(id) = category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            return Err(AppError::Validation(vec!["Unknown category".to_string()]));
        }
    }
    if let Some(id) = location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            return Err(AppError::Validation(vec!["Unknown location".to_string()]));
        }
    }

    Ok(())
}

/// GET /api/posts - publicly visible posts, newest first, 10 per page.
pub async fn index(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let page = state.posts.list_public(Utc::now(), query.page).await?;

    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/posts/{post_id} - detail with comments, oldest comment first.
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let (post, category) = state
        .posts
        .find_with_category(post_id)
        .await?
        .ok_or_else(hidden_or_missing)?;

    if !policy::can_view_detail(&post, category.as_ref(), viewer.user_id(), Utc::now()) {
        return Err(hidden_or_missing());
    }

    let comments = state.comments.list_for_post(post.id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        is_published: post.is_published,
        author_id: post.author_id,
        category_id: post.category_id,
        location_id: post.location_id,
        image: post.image,
        created_at: post.created_at,
        comments: comments.into_iter().map(comment_response).collect(),
    }))
}

/// POST /api/posts - create a post; the author is the authenticated user.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validate_fields(&req.title, &req.text)?;
    validate_relations(&state, req.category_id, req.location_id).await?;

    let mut post = Post::new(identity.user_id, req.title, req.text, req.pub_date);
    post.category_id = req.category_id;
    post.location_id = req.location_id;
    post.image = req.image;
    post.is_published = req.is_published;

    state.posts.insert(post).await?;

    Ok(see_other(profile_path(&identity.username)))
}

/// PATCH /api/posts/{post_id} - edit; owner only, others are sent back to
/// the detail view.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let mut post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(hidden_or_missing)?;

    if !policy::can_mutate(post.author_id, identity.user_id) {
        return Ok(see_other(post_detail_path(post_id)));
    }

    let req = body.into_inner();
    if let Some(title) = req.title {
        post.title = title;
    }
    if let Some(text) = req.text {
        post.text = text;
    }
    if let Some(pub_date) = req.pub_date {
        post.pub_date = pub_date;
    }
    if let Some(category_id) = req.category_id {
        post.category_id = category_id;
    }
    if let Some(location_id) = req.location_id {
        post.location_id = location_id;
    }
    if let Some(image) = req.image {
        post.image = image;
    }
    if let Some(is_published) = req.is_published {
        post.is_published = is_published;
    }

    validate_fields(&post.title, &post.text)?;
    validate_relations(&state, post.category_id, post.location_id).await?;

    state.posts.update(post).await?;

    Ok(see_other(post_detail_path(post_id)))
}

/// DELETE /api/posts/{post_id} - owner only; success redirects to the index.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(hidden_or_missing)?;

    if !policy::can_mutate(post.author_id, identity.user_id) {
        return Ok(see_other(post_detail_path(post_id)));
    }

    state.posts.delete(post_id).await?;

    Ok(see_other(index_path()))
}
