//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "0.1.0",
        description = "Books, authors, genres, publishers and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::get_status,
        loans::get_loan,
        loans::borrow_book,
        loans::return_book,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::BookDetails,
            crate::models::BookView,
            crate::models::Author,
            crate::models::Genre,
            crate::models::Publisher,
            crate::models::Borrower,
            crate::models::BorrowRequest,
            crate::models::BorrowCard,
            crate::models::LoanStatus,
            crate::models::LoanDetails,
            loans::StatusResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Borrowing and returning books")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
