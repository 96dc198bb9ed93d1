use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, PostPreview, User};
use crate::error::RepoError;

/// Items per listing page, everywhere.
pub const PAGE_SIZE: u64 = 10;

/// One page of a listing. `page` is 1-based; a page past the end is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Ids are generated by the caller, so insert and
    /// update are distinct operations.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Update an existing entity; `NotFound` if no row matches its id.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Find a category by slug, only if the category itself is published.
    /// An unpublished category is indistinguishable from a missing one.
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

/// Location repository. Only generic CRUD; locations are plain tags.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {}

/// Post repository. List methods return previews (row + comment count +
/// relation titles) one fixed-size page at a time, newest `pub_date` first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Publicly visible posts at `now`: published, past `pub_date`, and not
    /// in an unpublished category.
    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError>;

    /// Publicly visible posts in one category.
    async fn list_by_category(
        &self,
        category_id: Uuid,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError>;

    /// Posts authored by `author_id`. With `public_only` the visibility
    /// filter applies; without it, every post, hidden and future-dated ones
    /// included.
    async fn list_by_author(
        &self,
        author_id: Uuid,
        public_only: bool,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError>;

    /// Load one post together with its category, if it has one.
    async fn find_with_category(
        &self,
        id: Uuid,
    ) -> Result<Option<(Post, Option<Category>)>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}
