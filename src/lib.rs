//! Library catalog server
//!
//! Tracks books, their authors, genres and publishers, and whether each book
//! is currently lent out, behind a REST JSON API.

use std::sync::Arc;

use sqlx::SqlitePool;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: SqlitePool,
}

impl AppState {
    /// Build the state over an already migrated pool
    pub fn new(config: AppConfig, pool: SqlitePool) -> Self {
        let repository = repository::Repository::new(pool.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services::Services::new(repository)),
            pool,
        }
    }
}
