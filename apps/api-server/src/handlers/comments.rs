//! Comment handlers.
//!
//! A comment's post and author always come from the request path and the
//! authenticated identity; payload fields naming either are ignored. Every
//! outcome routes back to the post's detail resource.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::domain::Comment;
use blogicum_core::policy;
use blogicum_shared::dto::CommentRequest;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{post_detail_path, see_other};

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}

fn validate_text(text: &str) -> AppResult<()> {
    if text.is_empty() {
        return Err(AppError::Validation(vec![
            "Comment text must not be empty".to_string(),
        ]));
    }

    Ok(())
}

/// POST /api/posts/{post_id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    validate_text(&req.text)?;

    // The post must exist; the comment is stamped from path and token.
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comment = Comment::new(post_id, identity.user_id, req.text);
    state.comments.insert(comment).await?;

    Ok(see_other(post_detail_path(post_id)))
}

/// PATCH /api/posts/{post_id}/comments/{comment_id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let mut comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(comment_not_found)?;

    if !policy::can_mutate(comment.author_id, identity.user_id) {
        return Ok(see_other(post_detail_path(post_id)));
    }

    let req = body.into_inner();
    validate_text(&req.text)?;
    comment.text = req.text;

    state.comments.update(comment).await?;

    Ok(see_other(post_detail_path(post_id)))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(comment_not_found)?;

    if !policy::can_mutate(comment.author_id, identity.user_id) {
        return Ok(see_other(post_detail_path(post_id)));
    }

    state.comments.delete(comment.id).await?;

    Ok(see_other(post_detail_path(post_id)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use blogicum_shared::dto::PostDetailResponse;
    use serde_json::json;

    use crate::test_app;
    use crate::test_support::test_context;

    #[actix_web::test]
    async fn create_stamps_post_and_author_from_request_context() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let post = ctx.seed_post(&alice, 1, true);

        let app = test_app!(ctx);
        // Client-supplied post/author references must be ignored.
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{}/comments", post.id))
            .insert_header((header::AUTHORIZATION, ctx.bearer(&alice)))
            .set_json(json!({
                "text": "nice trip",
                "post_id": uuid::Uuid::new_v4(),
                "author_id": uuid::Uuid::new_v4(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            format!("/api/posts/{}", post.id).as_str()
        );

        let comments = ctx.store.comments.lock().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].post_id, post.id);
        assert_eq!(comments[0].author_id, alice.id);
    }

    #[actix_web::test]
    async fn create_requires_auth() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let post = ctx.seed_post(&alice, 1, true);

        let app = test_app!(ctx);
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{}/comments", post.id))
            .set_json(json!({ "text": "anonymous" }))
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn non_owner_edit_redirects_and_leaves_comment_unmodified() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let bob = ctx.seed_user("bob");
        let post = ctx.seed_post(&alice, 1, true);
        let comment = ctx.seed_comment(&post, &alice, "original");

        let app = test_app!(ctx);
        let req = test::TestRequest::patch()
            .uri(&format!("/api/posts/{}/comments/{}", post.id, comment.id))
            .insert_header((header::AUTHORIZATION, ctx.bearer(&bob)))
            .set_json(json!({ "text": "defaced" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            format!("/api/posts/{}", post.id).as_str()
        );
        assert_eq!(ctx.store.comments.lock().unwrap()[0].text, "original");
    }

    #[actix_web::test]
    async fn non_owner_delete_redirects_and_keeps_comment() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let bob = ctx.seed_user("bob");
        let post = ctx.seed_post(&alice, 1, true);
        let comment = ctx.seed_comment(&post, &alice, "keep me");

        let app = test_app!(ctx);
        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}/comments/{}", post.id, comment.id))
            .insert_header((header::AUTHORIZATION, ctx.bearer(&bob)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(ctx.store.comments.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn detail_lists_comments_oldest_first_with_count() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let bob = ctx.seed_user("bob");
        let post = ctx.seed_post(&alice, 1, true);
        let first = ctx.seed_comment(&post, &bob, "first");
        let second = ctx.seed_comment(&post, &alice, "second");

        let app = test_app!(ctx);
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", post.id))
            .to_request();
        let detail: PostDetailResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(detail.comments.len(), 2);
        assert_eq!(detail.comments[0].id, first.id);
        assert_eq!(detail.comments[1].id, second.id);

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let page: blogicum_shared::dto::PageResponse<blogicum_shared::dto::PostPreviewResponse> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.items[0].comment_count, 2);
    }
}
