//! Borrow card (loan record) model and loan status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

use super::borrower::Borrower;

/// Current loan record of a book. A book owns at most one card, reused by
/// every subsequent loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowCard {
    pub id: i64,
    pub book_id: i64,
    pub borrower_id: Option<i64>,
    pub date_of_loan: Option<NaiveDate>,
    pub date_of_return: Option<NaiveDate>,
    pub borrowed: bool,
}

/// Derived loan status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "on loan")]
    OnLoan,
    #[serde(rename = "on shelf")]
    OnShelf,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::OnLoan => "on loan",
            LoanStatus::OnShelf => "on shelf",
        }
    }
}

impl From<bool> for LoanStatus {
    fn from(borrowed: bool) -> Self {
        if borrowed {
            LoanStatus::OnLoan
        } else {
            LoanStatus::OnShelf
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loan state of a book for display: status, card dates and current borrower
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub book_id: i64,
    pub status: LoanStatus,
    pub borrower: Option<Borrower>,
    pub date_of_loan: Option<NaiveDate>,
    pub date_of_return: Option<NaiveDate>,
}
