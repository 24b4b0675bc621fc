//! Borrow cards repository: the current loan record of each book

use chrono::Local;
use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::{BorrowCard, LoanStatus},
};

use super::borrowers::BorrowersRepository;

const CARD_COLUMNS: &str = "id, book_id, borrower_id, date_of_loan, date_of_return, borrowed";

#[derive(Clone, Default)]
pub struct CardsRepository {
    borrowers: BorrowersRepository,
}

impl CardsRepository {
    pub fn new() -> Self {
        Self {
            borrowers: BorrowersRepository::new(),
        }
    }

    /// Id of the book's card, if it has one
    pub async fn find_card_id_for_book(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
    ) -> AppResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM borrow_cards WHERE book_id = $1")
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(id)
    }

    /// The book's card, if it has one
    pub async fn get_for_book(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
    ) -> AppResult<Option<BorrowCard>> {
        let sql = format!("SELECT {} FROM borrow_cards WHERE book_id = $1", CARD_COLUMNS);
        let card = sqlx::query_as::<_, BorrowCard>(&sql)
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(card)
    }

    /// Return the book's card, creating an idle one (`borrowed = false`) if absent
    pub async fn find_or_create_card(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
    ) -> AppResult<BorrowCard> {
        if let Some(card) = self.get_for_book(conn, book_id).await? {
            return Ok(card);
        }

        let sql = format!(
            "INSERT INTO borrow_cards (book_id, borrowed) VALUES ($1, 0) \
             ON CONFLICT (book_id) DO NOTHING RETURNING {}",
            CARD_COLUMNS
        );
        let inserted = sqlx::query_as::<_, BorrowCard>(&sql)
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?;

        match inserted {
            Some(card) => Ok(card),
            None => self.get_for_book(conn, book_id).await?.ok_or_else(|| {
                AppError::Internal(format!("Card for book {} vanished after insert conflict", book_id))
            }),
        }
    }

    /// Lend a book.
    ///
    /// Reuses the book's card and overwrites whatever loan it held: a second
    /// borrow of a book already on loan simply re-links the card to the new
    /// borrower.
    pub async fn borrow(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
        borrower_name: &str,
        borrower_lastname: &str,
    ) -> AppResult<BorrowCard> {
        let borrower = self
            .borrowers
            .find_or_create(conn, borrower_name, borrower_lastname)
            .await?;
        let card = self.find_or_create_card(conn, book_id).await?;

        let sql = format!(
            r#"
            UPDATE borrow_cards
            SET borrower_id = $1, book_id = $2, borrowed = 1,
                date_of_loan = $3, date_of_return = NULL
            WHERE id = $4
            RETURNING {}
            "#,
            CARD_COLUMNS
        );
        let card = sqlx::query_as::<_, BorrowCard>(&sql)
            .bind(borrower.id)
            .bind(book_id)
            .bind(Local::now().date_naive())
            .bind(card.id)
            .fetch_one(&mut *conn)
            .await?;

        self.link_book(conn, book_id, card.id).await?;

        Ok(card)
    }

    /// Mark a book as back on the shelf.
    ///
    /// A book that was never borrowed gets a fresh idle card rather than an
    /// error.
    pub async fn return_book(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<BorrowCard> {
        let card = self.find_or_create_card(conn, book_id).await?;

        let sql = format!(
            r#"
            UPDATE borrow_cards
            SET borrowed = 0, borrower_id = NULL, date_of_return = $1
            WHERE id = $2
            RETURNING {}
            "#,
            CARD_COLUMNS
        );
        let card = sqlx::query_as::<_, BorrowCard>(&sql)
            .bind(Local::now().date_naive())
            .bind(card.id)
            .fetch_one(&mut *conn)
            .await?;

        self.link_book(conn, book_id, card.id).await?;

        Ok(card)
    }

    /// Loan status of a book: on loan iff the book references a card whose
    /// borrowed flag is set. Books without a card are on the shelf.
    pub async fn get_status(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<LoanStatus> {
        let borrowed: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT c.borrowed
            FROM books b
            JOIN borrow_cards c ON c.id = b.borrow_card_id
            WHERE b.id = $1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(LoanStatus::from(borrowed.unwrap_or(false)))
    }

    async fn link_book(&self, conn: &mut SqliteConnection, book_id: i64, card_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE books SET borrow_card_id = $1 WHERE id = $2")
            .bind(card_id)
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
