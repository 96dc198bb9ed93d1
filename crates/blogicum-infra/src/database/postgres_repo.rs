//! PostgreSQL repository implementations.
//!
//! Listing queries reproduce the visibility predicate declaratively:
//! `is_published AND pub_date <= now AND (category_id IS NULL OR
//! categories.is_published)`, ordered newest `pub_date` first, ten rows per
//! page, each row annotated with its comment count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Post, PostPreview, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PAGE_SIZE, Page, PostRepository,
    UserRepository,
};

use super::entity::{category, comment, location, post, user};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<location::Entity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsPublished.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Flat row produced by the listing query.
#[derive(Debug, FromQueryResult)]
struct PostListingRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    text: String,
    pub_date: sea_orm::prelude::DateTimeWithTimeZone,
    is_published: bool,
    category_id: Option<Uuid>,
    location_id: Option<Uuid>,
    image: Option<String>,
    created_at: sea_orm::prelude::DateTimeWithTimeZone,
    author_username: String,
    category_title: Option<String>,
    location_name: Option<String>,
    comment_count: i64,
}

impl From<PostListingRow> for PostPreview {
    fn from(row: PostListingRow) -> Self {
        Self {
            post: Post {
                id: row.id,
                author_id: row.author_id,
                title: row.title,
                text: row.text,
                pub_date: row.pub_date.into(),
                is_published: row.is_published,
                category_id: row.category_id,
                location_id: row.location_id,
                image: row.image,
                created_at: row.created_at.into(),
            },
            comment_count: row.comment_count.max(0) as u64,
            author_username: row.author_username,
            category_title: row.category_title,
            location_name: row.location_name,
        }
    }
}

/// Base listing select: posts joined with author, category, location and
/// comments, grouped per post so the comment count aggregates, newest first.
fn listing_select() -> Select<post::Entity> {
    post::Entity::find()
        .join(JoinType::InnerJoin, post::Relation::Author.def())
        .join(JoinType::LeftJoin, post::Relation::Category.def())
        .join(JoinType::LeftJoin, post::Relation::Location.def())
        .join(JoinType::LeftJoin, post::Relation::Comments.def())
        .column_as(user::Column::Username, "author_username")
        .column_as(category::Column::Title, "category_title")
        .column_as(location::Column::Name, "location_name")
        .column_as(comment::Column::Id.count(), "comment_count")
        .group_by(post::Column::Id)
        .group_by(user::Column::Username)
        .group_by(category::Column::Title)
        .group_by(location::Column::Name)
        .order_by_desc(post::Column::PubDate)
}

/// The public-visibility predicate, applied to a listing select.
fn visible_only(select: Select<post::Entity>, now: DateTime<Utc>) -> Select<post::Entity> {
    select
        .filter(post::Column::IsPublished.eq(true))
        .filter(post::Column::PubDate.lte(now))
        .filter(
            Condition::any()
                .add(post::Column::CategoryId.is_null())
                .add(category::Column::IsPublished.eq(true)),
        )
}

impl PostgresPostRepository {
    async fn fetch_page(
        &self,
        select: Select<post::Entity>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        let page = page.max(1);
        let paginator = select
            .into_model::<PostListingRow>()
            .paginate(&self.db, PAGE_SIZE);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(Page {
            items: items.into_iter().map(Into::into).collect(),
            page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        self.fetch_page(visible_only(listing_select(), now), page)
            .await
    }

    async fn list_by_category(
        &self,
        category_id: Uuid,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        let select =
            visible_only(listing_select(), now).filter(post::Column::CategoryId.eq(category_id));

        self.fetch_page(select, page).await
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        public_only: bool,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        let mut select = listing_select().filter(post::Column::AuthorId.eq(author_id));
        if public_only {
            select = visible_only(select, now);
        }

        self.fetch_page(select, page).await
    }

    async fn find_with_category(
        &self,
        id: Uuid,
    ) -> Result<Option<(Post, Option<Category>)>, RepoError> {
        let result = post::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(|(p, c)| (p.into(), c.map(Into::into))))
    }
}
