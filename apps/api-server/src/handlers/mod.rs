//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod profile;

use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;

use blogicum_core::domain::{Comment, PostPreview, User};
use blogicum_core::ports::Page;
use blogicum_shared::ErrorResponse;
use blogicum_shared::dto::{CommentResponse, PageResponse, PostPreviewResponse, UserResponse};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Posts and their comments
            .route("/posts", web::get().to(posts::index))
            .route("/posts", web::post().to(posts::create))
            .route("/posts/{post_id}", web::get().to(posts::detail))
            .route("/posts/{post_id}", web::patch().to(posts::update))
            .route("/posts/{post_id}", web::delete().to(posts::delete))
            .route(
                "/posts/{post_id}/comments",
                web::post().to(comments::create),
            )
            .route(
                "/posts/{post_id}/comments/{comment_id}",
                web::patch().to(comments::update),
            )
            .route(
                "/posts/{post_id}/comments/{comment_id}",
                web::delete().to(comments::delete),
            )
            // Category and profile listings
            .route("/categories/{slug}", web::get().to(categories::listing))
            .route("/profile", web::patch().to(profile::update))
            .route("/profile/{username}", web::get().to(profile::listing)),
    );
}

/// Fallback for unknown routes: the dedicated 404 document.
pub async fn not_found_fallback() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found("No such route"))
}

/// Listing page selector, 1-based.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u64,
}

fn first_page() -> u64 {
    1
}

/// A `303 See Other` pointing at `location`. Used both after successful
/// mutations and as the soft answer to ownership violations.
pub fn see_other(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn post_detail_path(post_id: uuid::Uuid) -> String {
    format!("/api/posts/{post_id}")
}

pub fn profile_path(username: &str) -> String {
    format!("/api/profile/{username}")
}

pub fn index_path() -> &'static str {
    "/api/posts"
}

// DTO mapping helpers. The shared crate stays free of domain types, so the
// conversions live here.

pub fn preview_response(preview: PostPreview) -> PostPreviewResponse {
    PostPreviewResponse {
        id: preview.post.id,
        title: preview.post.title,
        text: preview.post.text,
        pub_date: preview.post.pub_date,
        is_published: preview.post.is_published,
        author_username: preview.author_username,
        category_title: preview.category_title,
        location_name: preview.location_name,
        image: preview.post.image,
        comment_count: preview.comment_count,
    }
}

pub fn page_response(page: Page<PostPreview>) -> PageResponse<PostPreviewResponse> {
    PageResponse {
        items: page.items.into_iter().map(preview_response).collect(),
        page: page.page,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}

pub fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at: user.created_at,
    }
}

pub fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author_id: comment.author_id,
        text: comment.text,
        created_at: comment.created_at,
    }
}
