//! Data models for the catalog

pub mod author;
pub mod book;
pub mod borrower;
pub mod card;
pub mod genre;
pub mod naming;
pub mod publisher;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails, BookView};
pub use borrower::{BorrowRequest, Borrower};
pub use card::{BorrowCard, LoanDetails, LoanStatus};
pub use genre::Genre;
pub use publisher::Publisher;
