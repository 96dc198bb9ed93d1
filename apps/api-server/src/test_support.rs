//! In-memory repository fakes and fixtures for handler tests.
//!
//! The fakes implement the core ports over plain vectors and reuse the
//! policy functions for their listing filters, so handler tests run without
//! a database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, PostPreview, User};
use blogicum_core::error::RepoError;
use blogicum_core::policy;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PAGE_SIZE, Page,
    PasswordService, PostRepository, TokenService, UserRepository,
};
use blogicum_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

use crate::state::AppState;

#[derive(Default)]
pub struct MemStore {
    pub users: Mutex<Vec<User>>,
    pub categories: Mutex<Vec<Category>>,
    pub locations: Mutex<Vec<Location>>,
    pub posts: Mutex<Vec<Post>>,
    pub comments: Mutex<Vec<Comment>>,
}

macro_rules! impl_mem_base {
    ($repo:ident, $field:ident, $entity:ty) => {
        pub struct $repo(pub Arc<MemStore>);

        #[async_trait]
        impl BaseRepository<$entity, Uuid> for $repo {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$entity>, RepoError> {
                Ok(self
                    .0
                    .$field
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|e| e.id == id)
                    .cloned())
            }

            async fn insert(&self, entity: $entity) -> Result<$entity, RepoError> {
                self.0.$field.lock().unwrap().push(entity.clone());
                Ok(entity)
            }

            async fn update(&self, entity: $entity) -> Result<$entity, RepoError> {
                let mut items = self.0.$field.lock().unwrap();
                match items.iter_mut().find(|e| e.id == entity.id) {
                    Some(slot) => {
                        *slot = entity.clone();
                        Ok(entity)
                    }
                    None => Err(RepoError::NotFound),
                }
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                let mut items = self.0.$field.lock().unwrap();
                let before = items.len();
                items.retain(|e| e.id != id);
                if items.len() == before {
                    return Err(RepoError::NotFound);
                }
                Ok(())
            }
        }
    };
}

impl_mem_base!(MemUsers, users, User);
impl_mem_base!(MemCategories, categories, Category);
impl_mem_base!(MemLocations, locations, Location);
impl_mem_base!(MemPosts, posts, Post);
impl_mem_base!(MemComments, comments, Comment);

#[async_trait]
impl UserRepository for MemUsers {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemCategories {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .0
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug && c.is_published)
            .cloned())
    }
}

#[async_trait]
impl LocationRepository for MemLocations {}

#[async_trait]
impl CommentRepository for MemComments {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .0
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

impl MemPosts {
    fn category_of(&self, post: &Post) -> Option<Category> {
        post.category_id.and_then(|id| {
            self.0
                .categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
        })
    }

    fn preview(&self, post: Post) -> PostPreview {
        let author_username = self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == post.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let category_title = self.category_of(&post).map(|c| c.title);
        let location_name = post.location_id.and_then(|id| {
            self.0
                .locations
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.id == id)
                .map(|l| l.name.clone())
        });
        let comment_count = self
            .0
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post.id)
            .count() as u64;

        PostPreview {
            post,
            comment_count,
            author_username,
            category_title,
            location_name,
        }
    }

    fn listing<F>(&self, filter: F, page: u64) -> Page<PostPreview>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts: Vec<Post> = self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        let total_items = posts.len() as u64;
        let total_pages = total_items.div_ceil(PAGE_SIZE);
        let page = page.max(1);
        let items = posts
            .into_iter()
            .skip(((page - 1) * PAGE_SIZE) as usize)
            .take(PAGE_SIZE as usize)
            .map(|p| self.preview(p))
            .collect();

        Page {
            items,
            page,
            total_items,
            total_pages,
        }
    }

    fn visible(&self, post: &Post, now: DateTime<Utc>) -> bool {
        policy::is_publicly_visible(post, self.category_of(post).as_ref(), now)
    }
}

#[async_trait]
impl PostRepository for MemPosts {
    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        Ok(self.listing(|p| self.visible(p, now), page))
    }

    async fn list_by_category(
        &self,
        category_id: Uuid,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        Ok(self.listing(
            |p| p.category_id == Some(category_id) && self.visible(p, now),
            page,
        ))
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        public_only: bool,
        now: DateTime<Utc>,
        page: u64,
    ) -> Result<Page<PostPreview>, RepoError> {
        Ok(self.listing(
            |p| p.author_id == author_id && (!public_only || self.visible(p, now)),
            page,
        ))
    }

    async fn find_with_category(
        &self,
        id: Uuid,
    ) -> Result<Option<(Post, Option<Category>)>, RepoError> {
        let post = self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned();
        Ok(post.map(|p| {
            let category = self.category_of(&p);
            (p, category)
        }))
    }
}

/// Everything a handler test needs: the backing store, the app state wired
/// to fakes, and the auth services.
pub struct TestContext {
    pub store: Arc<MemStore>,
    pub state: AppState,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

pub fn test_context() -> TestContext {
    let store = Arc::new(MemStore::default());
    let state = AppState {
        users: Arc::new(MemUsers(store.clone())),
        categories: Arc::new(MemCategories(store.clone())),
        locations: Arc::new(MemLocations(store.clone())),
        posts: Arc::new(MemPosts(store.clone())),
        comments: Arc::new(MemComments(store.clone())),
    };
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret".to_string(),
        expiration_hours: 1,
        issuer: "test".to_string(),
    }));
    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    TestContext {
        store,
        state,
        tokens,
        passwords,
    }
}

impl TestContext {
    pub fn seed_user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "hash".to_string(),
        );
        self.store.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn seed_category(&self, slug: &str, is_published: bool) -> Category {
        let mut category = Category::new(
            slug.to_string(),
            format!("posts about {slug}"),
            slug.to_string(),
        );
        category.is_published = is_published;
        self.store.categories.lock().unwrap().push(category.clone());
        category
    }

    /// A post published `days_ago` days in the past (negative for future).
    pub fn seed_post(&self, author: &User, days_ago: i64, is_published: bool) -> Post {
        let mut post = Post::new(
            author.id,
            "title".to_string(),
            "text".to_string(),
            Utc::now() - TimeDelta::days(days_ago),
        );
        post.is_published = is_published;
        self.store.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn assign_category(&self, post_id: Uuid, category_id: Uuid) {
        let mut posts = self.store.posts.lock().unwrap();
        if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
            post.category_id = Some(category_id);
        }
    }

    pub fn seed_comment(&self, post: &Post, author: &User, text: &str) -> Comment {
        let comment = Comment::new(post.id, author.id, text.to_string());
        self.store.comments.lock().unwrap().push(comment.clone());
        comment
    }

    /// "Bearer ..." header value for `user`.
    pub fn bearer(&self, user: &User) -> String {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        format!("Bearer {token}")
    }
}

/// Build the full service under test against a [`TestContext`].
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .app_data(actix_web::web::Data::new($ctx.tokens.clone()))
                .app_data(actix_web::web::Data::new($ctx.passwords.clone()))
                .configure($crate::handlers::configure_routes)
                .default_service(
                    actix_web::web::route().to($crate::handlers::not_found_fallback),
                ),
        )
        .await
    };
}
