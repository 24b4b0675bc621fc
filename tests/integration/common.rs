//! Shared fixtures

use library_catalog::{
    config::{AppConfig, DatabaseConfig},
    models::BookDetails,
    repository::{self, Repository},
    services::Services,
    AppState,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh migrated in-memory database
pub async fn test_pool() -> SqlitePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    repository::connect(&config).await.expect("Failed to init DB")
}

/// Migrated database file inside `dir`, shared by several connections
pub async fn file_pool(dir: &TempDir, max_connections: u32) -> SqlitePool {
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("catalog.db").display()),
        max_connections,
        min_connections: 1,
    };
    repository::connect(&config).await.expect("Failed to init DB")
}

pub async fn test_repository() -> Repository {
    Repository::new(test_pool().await)
}

pub async fn test_services() -> Services {
    Services::new(test_repository().await)
}

pub async fn test_state() -> AppState {
    AppState::new(AppConfig::default(), test_pool().await)
}

pub fn book(title: &str, author_name: &str, author_lastname: &str, genre: &str, publisher: &str) -> BookDetails {
    BookDetails {
        title: title.to_string(),
        rating: 5,
        description: String::new(),
        author_name: author_name.to_string(),
        author_lastname: author_lastname.to_string(),
        genre: genre.to_string(),
        publisher: publisher.to_string(),
    }
}

pub fn dune() -> BookDetails {
    BookDetails {
        title: "Dune".to_string(),
        rating: 9,
        description: "Spice and sandworms".to_string(),
        author_name: "Frank".to_string(),
        author_lastname: "Herbert".to_string(),
        genre: "Science Fiction".to_string(),
        publisher: "Ace".to_string(),
    }
}
