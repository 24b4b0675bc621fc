//! Authors repository. Authors are linked to books through `bibliographies`.

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::Author,
};

#[derive(Clone, Default)]
pub struct AuthorsRepository;

impl AuthorsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Get author by ID
    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT id, name, lastname FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(author)
    }

    /// Find an author by exact (case-sensitive) name and lastname
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        lastname: &str,
    ) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, lastname FROM authors WHERE name = $1 AND lastname = $2",
        )
        .bind(name)
        .bind(lastname)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(author)
    }

    pub async fn find_id(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        lastname: &str,
    ) -> AppResult<Option<i64>> {
        Ok(self.find(conn, name, lastname).await?.map(|a| a.id))
    }

    /// Insert author if new, or return the existing row
    pub async fn find_or_create(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        lastname: &str,
    ) -> AppResult<Author> {
        if let Some(existing) = self.find(conn, name, lastname).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, lastname) VALUES ($1, $2)
            ON CONFLICT (name, lastname) DO NOTHING
            RETURNING id, name, lastname
            "#,
        )
        .bind(name)
        .bind(lastname)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(author) => {
                tracing::debug!("Created author {} (id={})", author.full_name(), author.id);
                Ok(author)
            }
            None => self.find(conn, name, lastname).await?.ok_or_else(|| {
                AppError::Internal(format!("Author {} {} vanished after insert conflict", name, lastname))
            }),
        }
    }

    /// Number of books the author is linked to
    pub async fn book_count(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bibliographies WHERE author_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Change an author's name.
    ///
    /// An author linked to more than one book is forked: a separate author row
    /// with the new name is returned and the other books keep the original.
    /// An author of a single book is renamed in place. A name that already
    /// belongs to another author resolves to that author.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        name: &str,
        lastname: &str,
    ) -> AppResult<Author> {
        let current = self
            .get(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;

        if current.name == name && current.lastname == lastname {
            return Ok(current);
        }

        if let Some(existing) = self.find(conn, name, lastname).await? {
            return Ok(existing);
        }

        if self.book_count(conn, id).await? > 1 {
            tracing::debug!("Author id={} has several books, forking {} {}", id, name, lastname);
            return self.find_or_create(conn, name, lastname).await;
        }

        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $1, lastname = $2 WHERE id = $3 RETURNING id, name, lastname",
        )
        .bind(name)
        .bind(lastname)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(author)
    }

    /// Delete an author and its book links
    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }

        Ok(())
    }

    /// Count all authors
    pub async fn count(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }
}
