//! Loan management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{BorrowCard, BorrowRequest, LoanDetails, LoanStatus},
    AppState,
};

/// Loan status of a book
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub book_id: i64,
    pub status: LoanStatus,
}

/// Get the loan status of a book
#[utoipa::path(
    get,
    path = "/books/{id}/status",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Loan status", body = StatusResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(book_id): Path<i64>) -> AppResult<Json<StatusResponse>> {
    let status = state.services.loans.get_status(book_id).await?;
    Ok(Json(StatusResponse { book_id, status }))
}

/// Get the current loan of a book
#[utoipa::path(
    get,
    path = "/books/{id}/loan",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Loan status, dates and borrower", body = LoanDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_loan(State(state): State<AppState>, Path(book_id): Path<i64>) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(book_id).await?;
    Ok(Json(loan))
}

/// Lend a book to a borrower
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book lent", body = BorrowCard),
        (status = 400, description = "Invalid borrower"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<Json<BorrowCard>> {
    let card = state.services.loans.borrow(book_id, &request).await?;
    Ok(Json(card))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowCard),
        (status = 404, description = "Book not found")
    )
)]
pub async fn return_book(State(state): State<AppState>, Path(book_id): Path<i64>) -> AppResult<Json<BorrowCard>> {
    let card = state.services.loans.return_book(book_id).await?;
    Ok(Json(card))
}
