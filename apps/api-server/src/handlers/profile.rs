//! Profile handlers: a user's post listing and self-service profile edit.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_shared::dto::{ProfilePageResponse, ProfileUpdateRequest};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{PageQuery, page_response, profile_path, see_other, user_response};

/// GET /api/profile/{username}
///
/// The profile owner sees all of their posts, hidden and future-dated ones
/// included; everyone else sees only the publicly visible subset.
pub async fn listing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();

    let profile = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let public_only = viewer.user_id() != Some(profile.id);
    let posts = state
        .posts
        .list_by_author(profile.id, public_only, Utc::now(), query.page)
        .await?;

    Ok(HttpResponse::Ok().json(ProfilePageResponse {
        profile: user_response(profile),
        posts: page_response(posts),
    }))
}

/// PATCH /api/profile - edit the authenticated user's own profile.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileUpdateRequest>,
) -> AppResult<HttpResponse> {
    let mut user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let req = body.into_inner();

    if let Some(username) = req.username {
        if username.is_empty() || username.len() > 150 {
            return Err(AppError::Validation(vec!["Invalid username".to_string()]));
        }
        if username != user.username
            && state.users.find_by_username(&username).await?.is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        user.username = username;
    }
    if let Some(email) = req.email {
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(vec![
                "Invalid email address".to_string(),
            ]));
        }
        if email != user.email && state.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        user.email = email;
    }
    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }

    let saved = state.users.update(user).await?;

    Ok(see_other(profile_path(&saved.username)))
}
