//! Book model, create/update payload and display aggregate

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::card::LoanStatus;
use super::naming::title_case;

/// Book row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub genre_id: Option<i64>,
    pub publisher_id: Option<i64>,
    pub rating: i32,
    pub description: String,
    pub borrow_card_id: Option<i64>,
}

/// Fields submitted when creating or updating a book
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookDetails {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[validate(range(min = 0, max = 10, message = "Rating must be between 0 and 10"))]
    pub rating: i32,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 20, message = "Author name must be 1-20 characters"))]
    pub author_name: String,
    #[validate(length(min = 1, max = 30, message = "Author lastname must be 1-30 characters"))]
    pub author_lastname: String,
    #[validate(length(min = 1, max = 50, message = "Genre must be 1-50 characters"))]
    pub genre: String,
    #[validate(length(min = 1, max = 50, message = "Publisher must be 1-50 characters"))]
    pub publisher: String,
}

impl BookDetails {
    /// Title-case every natural key; the description is kept as written.
    pub fn normalized(&self) -> Self {
        Self {
            title: title_case(&self.title),
            rating: self.rating,
            description: self.description.clone(),
            author_name: title_case(&self.author_name),
            author_lastname: title_case(&self.author_lastname),
            genre: title_case(&self.genre),
            publisher: title_case(&self.publisher),
        }
    }
}

/// Display-ready book: first linked author, genre, publisher and loan status.
///
/// Books with several authors only expose the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookView {
    pub id: i64,
    pub title: String,
    pub author_name: Option<String>,
    pub author_lastname: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub rating: i32,
    pub description: String,
    pub status: LoanStatus,
}
