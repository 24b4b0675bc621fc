//! Borrower model and borrow request

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::naming::title_case;

/// Borrower row. Natural key is `(name, lastname)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i64,
    pub name: String,
    pub lastname: String,
}

/// Borrow a book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    #[validate(length(min = 1, max = 20, message = "Borrower name must be 1-20 characters"))]
    pub borrower_name: String,
    #[validate(length(min = 1, max = 30, message = "Borrower lastname must be 1-30 characters"))]
    pub borrower_lastname: String,
}

impl BorrowRequest {
    pub fn normalized(&self) -> Self {
        Self {
            borrower_name: title_case(&self.borrower_name),
            borrower_lastname: title_case(&self.borrower_lastname),
        }
    }
}
