//! Category listing handler.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_shared::dto::CategoryPageResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{PageQuery, page_response};

/// GET /api/categories/{slug}
///
/// The category must itself be published; a hidden category is answered
/// exactly like a missing one.
pub async fn listing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let category = state
        .categories
        .find_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let posts = state
        .posts
        .list_by_category(category.id, Utc::now(), query.page)
        .await?;

    Ok(HttpResponse::Ok().json(CategoryPageResponse {
        title: category.title,
        description: category.description,
        slug: category.slug,
        posts: page_response(posts),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use blogicum_shared::dto::CategoryPageResponse;

    use crate::test_app;
    use crate::test_support::test_context;

    #[actix_web::test]
    async fn listing_shows_only_visible_posts_in_category() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let travel = ctx.seed_category("travel", true);
        let yesterday = ctx.seed_post(&alice, 1, true);
        let tomorrow = ctx.seed_post(&alice, -1, true);
        ctx.assign_category(yesterday.id, travel.id);
        ctx.assign_category(tomorrow.id, travel.id);

        let app = test_app!(ctx);
        let req = test::TestRequest::get()
            .uri("/api/categories/travel")
            .to_request();
        let page: CategoryPageResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(page.slug, "travel");
        assert_eq!(page.posts.items.len(), 1);
        assert_eq!(page.posts.items[0].id, yesterday.id);
    }

    #[actix_web::test]
    async fn hidden_category_is_not_found() {
        let ctx = test_context();
        let alice = ctx.seed_user("alice");
        let secret = ctx.seed_category("secret", false);
        let post = ctx.seed_post(&alice, 1, true);
        ctx.assign_category(post.id, secret.id);

        let app = test_app!(ctx);
        let req = test::TestRequest::get()
            .uri("/api/categories/secret")
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn unknown_slug_is_not_found() {
        let ctx = test_context();

        let app = test_app!(ctx);
        let req = test::TestRequest::get()
            .uri("/api/categories/nope")
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
