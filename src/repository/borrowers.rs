//! Borrowers repository

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::Borrower,
};

#[derive(Clone, Default)]
pub struct BorrowersRepository;

impl BorrowersRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Borrower>> {
        let borrower =
            sqlx::query_as::<_, Borrower>("SELECT id, name, lastname FROM borrowers WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(borrower)
    }

    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        lastname: &str,
    ) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, lastname FROM borrowers WHERE name = $1 AND lastname = $2",
        )
        .bind(name)
        .bind(lastname)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(borrower)
    }

    /// Insert borrower if new, or return the existing row
    pub async fn find_or_create(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        lastname: &str,
    ) -> AppResult<Borrower> {
        if let Some(existing) = self.find(conn, name, lastname).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (name, lastname) VALUES ($1, $2)
            ON CONFLICT (name, lastname) DO NOTHING
            RETURNING id, name, lastname
            "#,
        )
        .bind(name)
        .bind(lastname)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(borrower) => Ok(borrower),
            None => self.find(conn, name, lastname).await?.ok_or_else(|| {
                AppError::Internal(format!("Borrower {} {} vanished after insert conflict", name, lastname))
            }),
        }
    }

    pub async fn count(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }
}
