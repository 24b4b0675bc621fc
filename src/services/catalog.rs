//! Catalog management service
//!
//! Normalizes and validates submitted book details, then runs each
//! repository operation on its own transaction.

use std::time::Duration;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookDetails, BookView},
    repository::Repository,
};

/// Attempts of `add_book` before a conflict or busy store is reported
const ADD_BOOK_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books as display aggregates
    pub async fn list_books(&self) -> AppResult<Vec<BookView>> {
        let mut conn = self.repository.pool.acquire().await?;
        self.repository.books.list_all(&mut conn).await
    }

    /// Get one book aggregate by ID
    pub async fn get_book(&self, id: i64) -> AppResult<BookView> {
        let mut conn = self.repository.pool.acquire().await?;
        self.repository
            .books
            .get_book(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Id of the book with this title, after normalization
    pub async fn find_book_id(&self, title: &str) -> AppResult<Option<i64>> {
        let title = crate::models::naming::title_case(title);
        let mut conn = self.repository.pool.acquire().await?;
        self.repository.books.find_id_by_title(&mut conn, &title).await
    }

    /// Create a book, its author, genre and publisher in one transaction.
    ///
    /// A title that already exists returns the existing book unchanged.
    /// A natural-key conflict or a lock held by a concurrent writer retries
    /// the whole transaction, which then finds the rows the other writer
    /// committed.
    pub async fn add_book(&self, details: &BookDetails) -> AppResult<Book> {
        let details = details.normalized();
        details.validate()?;

        let mut attempt = 1;
        loop {
            match self.try_add_book(&details).await {
                Err(e) if e.is_retryable() && attempt < ADD_BOOK_ATTEMPTS => {
                    tracing::warn!(
                        "Adding '{}' failed (attempt {}/{}), retrying: {}",
                        details.title,
                        attempt,
                        ADD_BOOK_ATTEMPTS,
                        e
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_add_book(&self, details: &BookDetails) -> AppResult<Book> {
        let mut tx = self.repository.begin().await?;
        let book = self.repository.books.add_book(&mut tx, details).await?;
        tx.commit().await?;

        tracing::info!("Added book '{}' (id={})", book.title, book.id);
        Ok(book)
    }

    /// Create a book, rejecting a title that is already catalogued
    pub async fn create_book(&self, details: &BookDetails) -> AppResult<Book> {
        if let Some(id) = self.find_book_id(&details.title).await? {
            return Err(AppError::Conflict(format!(
                "A book titled '{}' already exists (id={})",
                details.title.trim(),
                id
            )));
        }
        self.add_book(details).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i64, details: &BookDetails) -> AppResult<Book> {
        let details = details.normalized();
        details.validate()?;

        let mut tx = self.repository.begin().await?;
        let book = self.repository.books.update(&mut tx, id, &details).await?;
        tx.commit().await?;

        tracing::info!("Updated book '{}' (id={})", book.title, book.id);
        Ok(book)
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        self.repository.books.delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted book id={}", id);
        Ok(())
    }
}
