//! Repository for single-name reference entities (genres, publishers).
//!
//! Both tables share the same shape, `(id, name UNIQUE)`, and are referenced
//! from `books` through one foreign-key column, so one generic implementation
//! serves both.

use std::marker::PhantomData;

use sqlx::{sqlite::SqliteRow, FromRow, SqliteConnection};

use crate::{
    error::{AppError, AppResult},
    models::{Genre, Publisher},
};

/// A reference entity identified by a unique name and attached to books
pub trait NamedEntity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table holding the entity rows
    const TABLE: &'static str;
    /// Column of `books` pointing at the entity
    const BOOK_COLUMN: &'static str;
    /// Human label used in error messages
    const LABEL: &'static str;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

impl NamedEntity for Genre {
    const TABLE: &'static str = "genres";
    const BOOK_COLUMN: &'static str = "genre_id";
    const LABEL: &'static str = "Genre";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntity for Publisher {
    const TABLE: &'static str = "publishers";
    const BOOK_COLUMN: &'static str = "publisher_id";
    const LABEL: &'static str = "Publisher";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct NamedRepository<T> {
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for NamedRepository<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> NamedRepository<T> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<T> Default for NamedRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NamedEntity> NamedRepository<T> {
    /// Get entity by ID
    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<T>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Find entity by exact name
    pub async fn find(&self, conn: &mut SqliteConnection, name: &str) -> AppResult<Option<T>> {
        let sql = format!("SELECT id, name FROM {} WHERE name = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Find entity id by exact name
    pub async fn find_id(&self, conn: &mut SqliteConnection, name: &str) -> AppResult<Option<i64>> {
        Ok(self.find(conn, name).await?.map(|e| e.id()))
    }

    /// Return the entity with this name, inserting it first if absent.
    ///
    /// The UNIQUE constraint on `name` arbitrates concurrent inserts: the loser
    /// of a race inserts nothing and reads the winner's row.
    pub async fn find_or_create(&self, conn: &mut SqliteConnection, name: &str) -> AppResult<T> {
        if let Some(existing) = self.find(conn, name).await? {
            return Ok(existing);
        }

        let sql = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id, name",
            T::TABLE
        );
        let inserted = sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        match inserted {
            Some(row) => {
                tracing::debug!("Created {} '{}' (id={})", T::LABEL, name, row.id());
                Ok(row)
            }
            None => self.find(conn, name).await?.ok_or_else(|| {
                AppError::Internal(format!("{} '{}' vanished after insert conflict", T::LABEL, name))
            }),
        }
    }

    /// Number of books referencing the entity
    pub async fn usage_count(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM books WHERE {} = $1", T::BOOK_COLUMN);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Rename an entity without rewriting other books' data.
    ///
    /// When the entity is shared by several books a new row carrying the new
    /// name is returned and the original is left untouched; otherwise the row
    /// is renamed in place. A name that already exists resolves to that row.
    pub async fn rename(&self, conn: &mut SqliteConnection, id: i64, new_name: &str) -> AppResult<T> {
        let current = self
            .get(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", T::LABEL, id)))?;

        if current.name() == new_name {
            return Ok(current);
        }

        if let Some(existing) = self.find(conn, new_name).await? {
            return Ok(existing);
        }

        if self.usage_count(conn, id).await? > 1 {
            tracing::debug!(
                "{} id={} is shared, forking '{}' instead of renaming",
                T::LABEL,
                id,
                new_name
            );
            return self.find_or_create(conn, new_name).await;
        }

        let sql = format!("UPDATE {} SET name = $1 WHERE id = $2 RETURNING id, name", T::TABLE);
        let renamed = sqlx::query_as::<_, T>(&sql)
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(renamed)
    }

    /// Point a book at this entity
    pub async fn attach_book(&self, conn: &mut SqliteConnection, id: i64, book_id: i64) -> AppResult<()> {
        let sql = format!("UPDATE books SET {} = $1 WHERE id = $2", T::BOOK_COLUMN);
        sqlx::query(&sql)
            .bind(id)
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete the entity. Books referencing it lose the reference (set to NULL).
    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} with id {} not found", T::LABEL, id)));
        }

        Ok(())
    }

    /// Count all rows
    pub async fn count(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
        Ok(count)
    }
}
