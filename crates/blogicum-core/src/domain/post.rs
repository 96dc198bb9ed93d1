use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a single authored blog entry with scheduled publication time.
///
/// A `pub_date` in the future makes the post a deferred publication: stored,
/// editable by its author, but absent from public listings until the time
/// arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Relative path of an attached image, if any.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            pub_date,
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
            created_at: Utc::now(),
        }
    }
}

/// A post as it appears in a listing: the row itself plus its comment count
/// and the display names of its optional relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPreview {
    pub post: Post,
    pub comment_count: u64,
    pub author_username: String,
    pub category_title: Option<String>,
    pub location_name: Option<String>,
}
