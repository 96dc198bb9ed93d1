use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - a reply attached to exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment on `post_id` by `author_id`.
    ///
    /// Both references come from the request context, never from client
    /// payload fields.
    pub fn new(post_id: Uuid, author_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}
