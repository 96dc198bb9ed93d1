//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_infra::database::{
    DatabaseConfig, DatabaseConnections, DbErr, PostgresCategoryRepository,
    PostgresCommentRepository, PostgresLocationRepository, PostgresPostRepository,
    PostgresUserRepository,
};

/// Shared application state: one repository per entity, all backed by the
/// same connection pool.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl AppState {
    /// Build the application state on top of a PostgreSQL pool.
    pub async fn new(db_config: &DatabaseConfig) -> Result<Self, DbErr> {
        let connections = DatabaseConnections::init(db_config).await?;
        let db = connections.main;

        tracing::info!("Application state initialized");

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            locations: Arc::new(PostgresLocationRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db)),
        })
    }
}
