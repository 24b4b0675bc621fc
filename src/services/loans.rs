//! Loan management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{BorrowCard, BorrowRequest, LoanDetails, LoanStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Lend a book to a borrower.
    ///
    /// A book already on loan is re-lent to the new borrower; the previous
    /// loan is overwritten.
    pub async fn borrow(&self, book_id: i64, request: &BorrowRequest) -> AppResult<BorrowCard> {
        let request = request.normalized();
        request.validate()?;

        let mut tx = self.repository.begin().await?;
        self.ensure_book(&mut tx, book_id).await?;

        if let Some(previous) = self.repository.cards.get_for_book(&mut tx, book_id).await? {
            if previous.borrowed {
                tracing::warn!(
                    "Book id={} is already on loan (borrower id={:?}), overwriting the loan",
                    book_id,
                    previous.borrower_id
                );
            }
        }

        let card = self
            .repository
            .cards
            .borrow(&mut tx, book_id, &request.borrower_name, &request.borrower_lastname)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Book id={} lent to {} {}",
            book_id,
            request.borrower_name,
            request.borrower_lastname
        );
        Ok(card)
    }

    /// Return a book. Returning a book that was never lent is not an error.
    pub async fn return_book(&self, book_id: i64) -> AppResult<BorrowCard> {
        let mut tx = self.repository.begin().await?;
        self.ensure_book(&mut tx, book_id).await?;
        let card = self.repository.cards.return_book(&mut tx, book_id).await?;
        tx.commit().await?;

        tracing::info!("Book id={} returned", book_id);
        Ok(card)
    }

    /// Loan status of a book
    pub async fn get_status(&self, book_id: i64) -> AppResult<LoanStatus> {
        let mut conn = self.repository.pool.acquire().await?;
        self.ensure_book(&mut conn, book_id).await?;
        self.repository.cards.get_status(&mut conn, book_id).await
    }

    /// Current loan of a book: status, dates and borrower
    pub async fn get_loan(&self, book_id: i64) -> AppResult<LoanDetails> {
        let mut conn = self.repository.pool.acquire().await?;
        self.ensure_book(&mut conn, book_id).await?;

        let status = self.repository.cards.get_status(&mut conn, book_id).await?;
        let card = self.repository.cards.get_for_book(&mut conn, book_id).await?;

        let borrower = match card.as_ref().and_then(|c| c.borrower_id) {
            Some(id) => self.repository.borrowers.get(&mut conn, id).await?,
            None => None,
        };

        Ok(LoanDetails {
            book_id,
            status,
            borrower,
            date_of_loan: card.as_ref().and_then(|c| c.date_of_loan),
            date_of_return: card.as_ref().and_then(|c| c.date_of_return),
        })
    }

    async fn ensure_book(&self, conn: &mut sqlx::SqliteConnection, book_id: i64) -> AppResult<()> {
        match self.repository.books.get(conn, book_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Book with id {} not found", book_id))),
        }
    }
}
