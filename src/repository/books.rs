//! Books repository.
//!
//! Composes the author, genre, publisher and card repositories to create,
//! read, update and delete books along with their links.

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookDetails, BookView, Genre, Publisher},
};

use super::{authors::AuthorsRepository, cards::CardsRepository, named::NamedRepository};

const BOOK_COLUMNS: &str = "id, title, genre_id, publisher_id, rating, description, borrow_card_id";

#[derive(Clone, Default)]
pub struct BooksRepository {
    authors: AuthorsRepository,
    genres: NamedRepository<Genre>,
    publishers: NamedRepository<Publisher>,
    cards: CardsRepository,
}

impl BooksRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book row by ID
    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Book>> {
        let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(book)
    }

    /// Find book id by exact title
    pub async fn find_id_by_title(&self, conn: &mut SqliteConnection, title: &str) -> AppResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE title = $1")
            .bind(title)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(id)
    }

    /// All book rows in insertion order
    pub async fn list(&self, conn: &mut SqliteConnection) -> AppResult<Vec<Book>> {
        let sql = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
        let books = sqlx::query_as::<_, Book>(&sql).fetch_all(&mut *conn).await?;
        Ok(books)
    }

    /// Authors of a book in the order they were linked
    pub async fn authors(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name, a.lastname
            FROM bibliographies bi
            JOIN authors a ON a.id = bi.author_id
            WHERE bi.book_id = $1
            ORDER BY bi.position, a.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(authors)
    }

    /// First linked author of a book
    pub async fn first_author(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<Option<Author>> {
        Ok(self.authors(conn, book_id).await?.into_iter().next())
    }

    /// Assemble the display aggregate of one book.
    ///
    /// Only the first linked author is exposed.
    pub async fn get_book(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Option<BookView>> {
        let Some(book) = self.get(conn, id).await? else {
            return Ok(None);
        };
        Ok(Some(self.assemble(conn, book).await?))
    }

    /// Display aggregate for every book, in insertion order
    pub async fn list_all(&self, conn: &mut SqliteConnection) -> AppResult<Vec<BookView>> {
        let books = self.list(conn).await?;

        let mut views = Vec::with_capacity(books.len());
        for book in books {
            views.push(self.assemble(conn, book).await?);
        }

        Ok(views)
    }

    async fn assemble(&self, conn: &mut SqliteConnection, book: Book) -> AppResult<BookView> {
        let author = self.first_author(conn, book.id).await?;

        let genre = match book.genre_id {
            Some(id) => self.genres.get(conn, id).await?.map(|g| g.name),
            None => None,
        };

        let publisher = match book.publisher_id {
            Some(id) => self.publishers.get(conn, id).await?.map(|p| p.name),
            None => None,
        };

        let status = self.cards.get_status(conn, book.id).await?;

        let (author_name, author_lastname) = match author {
            Some(a) => (Some(a.name), Some(a.lastname)),
            None => (None, None),
        };

        Ok(BookView {
            id: book.id,
            title: book.title,
            author_name,
            author_lastname,
            genre,
            publisher,
            rating: book.rating,
            description: book.description,
            status,
        })
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Find-or-create a bare book by title. Author, genre and publisher are
    /// not attached. The flag tells whether the row was inserted by this call;
    /// an existing row is returned unchanged.
    pub async fn create_or_get(
        &self,
        conn: &mut SqliteConnection,
        title: &str,
        rating: i32,
        description: &str,
    ) -> AppResult<(Book, bool)> {
        if let Some(id) = self.find_id_by_title(conn, title).await? {
            let book = self.require(conn, id).await?;
            return Ok((book, false));
        }

        let sql = format!(
            "INSERT INTO books (title, rating, description) VALUES ($1, $2, $3) \
             ON CONFLICT (title) DO NOTHING RETURNING {}",
            BOOK_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Book>(&sql)
            .bind(title)
            .bind(rating)
            .bind(description)
            .fetch_optional(&mut *conn)
            .await?;

        match inserted {
            Some(book) => Ok((book, true)),
            None => {
                let id = self.find_id_by_title(conn, title).await?.ok_or_else(|| {
                    AppError::Internal(format!("Book '{}' vanished after insert conflict", title))
                })?;
                Ok((self.require(conn, id).await?, false))
            }
        }
    }

    /// Create a book with its author, genre and publisher, creating any of
    /// them that do not exist yet.
    ///
    /// Idempotent on title: when a book with this title already exists it is
    /// returned untouched and nothing else is created or linked. Callers that
    /// must reject duplicates check `find_id_by_title` first.
    pub async fn add_book(&self, conn: &mut SqliteConnection, details: &BookDetails) -> AppResult<Book> {
        let (book, created) = self
            .create_or_get(conn, &details.title, details.rating, &details.description)
            .await?;

        if !created {
            tracing::debug!("Book '{}' already exists (id={}), leaving it as is", book.title, book.id);
            return Ok(book);
        }

        let author = self
            .authors
            .find_or_create(conn, &details.author_name, &details.author_lastname)
            .await?;
        let genre = self.genres.find_or_create(conn, &details.genre).await?;
        let publisher = self.publishers.find_or_create(conn, &details.publisher).await?;

        self.link_author(conn, book.id, author.id).await?;
        self.genres.attach_book(conn, genre.id, book.id).await?;
        self.publishers.attach_book(conn, publisher.id, book.id).await?;

        self.require(conn, book.id).await
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Overwrite a book from submitted details.
    ///
    /// Genre, publisher and first author go through their rename rules, so a
    /// reference shared with other books is forked rather than renamed for
    /// everyone. The book ends up linked to exactly one author.
    pub async fn update(&self, conn: &mut SqliteConnection, id: i64, details: &BookDetails) -> AppResult<Book> {
        let book = self.require(conn, id).await?;

        let genre = match book.genre_id {
            Some(genre_id) => self.genres.rename(conn, genre_id, &details.genre).await?,
            None => self.genres.find_or_create(conn, &details.genre).await?,
        };

        let publisher = match book.publisher_id {
            Some(publisher_id) => {
                self.publishers
                    .rename(conn, publisher_id, &details.publisher)
                    .await?
            }
            None => self.publishers.find_or_create(conn, &details.publisher).await?,
        };

        let author = match self.first_author(conn, id).await? {
            Some(current) => {
                self.authors
                    .update(conn, current.id, &details.author_name, &details.author_lastname)
                    .await?
            }
            None => {
                self.authors
                    .find_or_create(conn, &details.author_name, &details.author_lastname)
                    .await?
            }
        };

        self.clear_authors(conn, id).await?;
        self.link_author(conn, id, author.id).await?;

        let sql = format!(
            r#"
            UPDATE books SET
                title = $1,
                rating = $2,
                description = $3,
                genre_id = $4,
                publisher_id = $5
            WHERE id = $6
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&details.title)
            .bind(details.rating)
            .bind(&details.description)
            .bind(genre.id)
            .bind(publisher.id)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(book)
    }

    // =========================================================================
    // AUTHORS (bibliographies junction)
    // =========================================================================

    /// Append an author to a book's author list. Linking twice is a no-op.
    pub async fn link_author(&self, conn: &mut SqliteConnection, book_id: i64, author_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bibliographies (book_id, author_id, position)
            VALUES ($1, $2, (SELECT COALESCE(MAX(position), 0) + 1 FROM bibliographies WHERE book_id = $1))
            ON CONFLICT (book_id, author_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(author_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Remove every author link of a book
    pub async fn clear_authors(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM bibliographies WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Delete a book. Author links and the loan card go with it; authors,
    /// genres and publishers are kept even when no book references them.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Count all books
    pub async fn count(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn require(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<Book> {
        self.get(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}
