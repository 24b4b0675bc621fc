//! Repository layer for database operations.
//!
//! Sub-repositories hold no connection of their own: every operation takes an
//! explicit `&mut SqliteConnection`, so a service can run a multi-step
//! operation on one transaction (`Repository::begin`) and commit it as a unit.
//!
//! SQLite allows a single writer. Write transactions of this process are
//! serialized on `Repository::writer` before they touch the store, and file
//! databases run in WAL mode with a busy timeout so readers and writers of
//! other processes wait instead of failing.

pub mod authors;
pub mod books;
pub mod borrowers;
pub mod cards;
pub mod named;

use std::{
    ops::{Deref, DerefMut},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqliteConnection, SqlitePool, Transaction,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Genre, Publisher},
};

/// How long a connection waits for a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: SqlitePool,
    writer: Arc<Mutex<()>>,
    pub authors: authors::AuthorsRepository,
    pub genres: named::NamedRepository<Genre>,
    pub publishers: named::NamedRepository<Publisher>,
    pub books: books::BooksRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub cards: cards::CardsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(),
            genres: named::NamedRepository::new(),
            publishers: named::NamedRepository::new(),
            books: books::BooksRepository::new(),
            borrowers: borrowers::BorrowersRepository::new(),
            cards: cards::CardsRepository::new(),
            writer: Arc::new(Mutex::new(())),
            pool,
        }
    }

    /// Start a write unit of work. Waits until no other unit of work of this
    /// repository is open; dropping it without committing rolls every
    /// statement back.
    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        let writer = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx, _writer: writer })
    }
}

/// A transaction holding the writer lock until it is committed or dropped.
///
/// Derefs to the underlying connection, so `&mut uow` is accepted wherever a
/// repository operation expects `&mut SqliteConnection`.
pub struct UnitOfWork {
    // Declared first: the transaction is released before the lock
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

impl UnitOfWork {
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl Deref for UnitOfWork {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.tx
    }
}

impl DerefMut for UnitOfWork {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

/// Open the connection pool and apply the embedded migrations.
///
/// In-memory databases live as long as their connection, so they get a single
/// connection that is never recycled.
pub async fn connect(config: &DatabaseConfig) -> AppResult<SqlitePool> {
    let in_memory = config.url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run database migrations: {}", e)))?;

    Ok(pool)
}
