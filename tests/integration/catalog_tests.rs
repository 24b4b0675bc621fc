//! Catalog service: normalization, validation, duplicates and updates

use library_catalog::{
    models::{BorrowRequest, LoanStatus},
    AppError,
};

use library_catalog::{repository::Repository, services::Services};
use tempfile::TempDir;
use tokio::task::JoinSet;

use crate::common::{book, dune, file_pool, test_services};

#[tokio::test]
async fn test_dune_scenario() {
    let services = test_services().await;

    let created = services.catalog.add_book(&dune()).await.unwrap();

    let books = services.catalog.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dune");
    assert_eq!(books[0].status, LoanStatus::OnShelf);

    let jane = BorrowRequest {
        borrower_name: "Jane".to_string(),
        borrower_lastname: "Doe".to_string(),
    };
    services.loans.borrow(created.id, &jane).await.unwrap();
    let view = services.catalog.get_book(created.id).await.unwrap();
    assert_eq!(view.status, LoanStatus::OnLoan);

    services.loans.return_book(created.id).await.unwrap();
    let view = services.catalog.get_book(created.id).await.unwrap();
    assert_eq!(view.status, LoanStatus::OnShelf);

    services.catalog.delete_book(created.id).await.unwrap();
    assert!(services.catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_book_normalizes_natural_keys() {
    let services = test_services().await;

    let created = services
        .catalog
        .add_book(&book("  the left hand of darkness ", "ursula", "LE GUIN", "science fiction", "ace"))
        .await
        .unwrap();

    let view = services.catalog.get_book(created.id).await.unwrap();
    assert_eq!(view.title, "The Left Hand Of Darkness");
    assert_eq!(view.author_name.as_deref(), Some("Ursula"));
    assert_eq!(view.author_lastname.as_deref(), Some("Le Guin"));
    assert_eq!(view.genre.as_deref(), Some("Science Fiction"));
    assert_eq!(view.publisher.as_deref(), Some("Ace"));

    assert_eq!(
        services.catalog.find_book_id("THE LEFT HAND OF DARKNESS").await.unwrap(),
        Some(created.id)
    );
}

#[tokio::test]
async fn test_differently_cased_input_reuses_reference_entities() {
    let services = test_services().await;

    let a = services.catalog.add_book(&dune()).await.unwrap();
    let b = services
        .catalog
        .add_book(&book("Children Of Dune", "FRANK", "herbert", "science FICTION", "ACE"))
        .await
        .unwrap();

    assert_eq!(a.genre_id, b.genre_id);
    assert_eq!(a.publisher_id, b.publisher_id);
}

#[tokio::test]
async fn test_add_book_twice_keeps_one_row() {
    let services = test_services().await;

    let first = services.catalog.add_book(&dune()).await.unwrap();
    let second = services.catalog.add_book(&dune()).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(services.catalog.list_books().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_book_rejects_existing_title() {
    let services = test_services().await;

    services.catalog.create_book(&dune()).await.unwrap();

    let mut lower = dune();
    lower.title = "dune".to_string();
    let err = services.catalog.create_book(&lower).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_invalid_details_are_rejected_before_the_store() {
    let services = test_services().await;

    let mut bad = dune();
    bad.rating = 11;
    let err = services.catalog.add_book(&bad).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut bad = dune();
    bad.author_lastname = "x".repeat(31);
    let err = services.catalog.add_book(&bad).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut blank = dune();
    blank.genre = "   ".to_string();
    let err = services.catalog.add_book(&blank).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(services.catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_book_is_not_found() {
    let services = test_services().await;

    let err = services.catalog.get_book(99).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = services.catalog.delete_book(99).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = services.catalog.update_book(99, &dune()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_book_overwrites_fields() {
    let services = test_services().await;

    let created = services.catalog.add_book(&dune()).await.unwrap();

    let mut details = dune();
    details.title = "Dune (1965)".to_string();
    details.rating = 10;
    details.description = "Revised".to_string();
    details.genre = "Space Opera".to_string();
    details.publisher = "Chilton".to_string();
    let updated = services.catalog.update_book(created.id, &details).await.unwrap();

    assert_eq!(updated.id, created.id);
    // Genre and publisher were used by this book only: renamed in place
    assert_eq!(updated.genre_id, created.genre_id);
    assert_eq!(updated.publisher_id, created.publisher_id);

    let view = services.catalog.get_book(created.id).await.unwrap();
    assert_eq!(view.title, "Dune (1965)");
    assert_eq!(view.rating, 10);
    assert_eq!(view.description, "Revised");
    assert_eq!(view.genre.as_deref(), Some("Space Opera"));
    assert_eq!(view.publisher.as_deref(), Some("Chilton"));
}

#[tokio::test]
async fn test_update_book_forks_shared_references() {
    let services = test_services().await;

    let dune_book = services.catalog.add_book(&dune()).await.unwrap();
    let messiah = services
        .catalog
        .add_book(&book("Dune Messiah", "Frank", "Herbert", "Science Fiction", "Ace"))
        .await
        .unwrap();

    let mut details = dune();
    details.author_name = "Franklin".to_string();
    details.genre = "Space Opera".to_string();
    let updated = services.catalog.update_book(dune_book.id, &details).await.unwrap();

    assert_ne!(updated.genre_id, dune_book.genre_id);
    assert_eq!(updated.publisher_id, dune_book.publisher_id);

    let dune_view = services.catalog.get_book(dune_book.id).await.unwrap();
    assert_eq!(dune_view.author_name.as_deref(), Some("Franklin"));
    assert_eq!(dune_view.genre.as_deref(), Some("Space Opera"));

    // The other book keeps the original author and genre
    let messiah_view = services.catalog.get_book(messiah.id).await.unwrap();
    assert_eq!(messiah_view.author_name.as_deref(), Some("Frank"));
    assert_eq!(messiah_view.genre.as_deref(), Some("Science Fiction"));
}

#[tokio::test]
async fn test_update_to_taken_title_is_conflict() {
    let services = test_services().await;

    services.catalog.add_book(&dune()).await.unwrap();
    let other = services
        .catalog
        .add_book(&book("Hyperion", "Dan", "Simmons", "Science Fiction", "Doubleday"))
        .await
        .unwrap();

    let mut details = book("Dune", "Dan", "Simmons", "Science Fiction", "Doubleday");
    details.rating = 7;
    let err = services.catalog.update_book(other.id, &details).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Rolled back as a unit
    let view = services.catalog.get_book(other.id).await.unwrap();
    assert_eq!(view.title, "Hyperion");
    assert_eq!(view.rating, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_book_on_shared_file() {
    let dir = TempDir::new().unwrap();
    let pool = file_pool(&dir, 8).await;
    let services = Services::new(Repository::new(pool.clone()));

    for round in 0..5 {
        let mut tasks = JoinSet::new();
        for writer in 0..8 {
            let services = services.clone();
            let details = book(
                &format!("Round {} Volume {}", round, writer % 2),
                "Ursula",
                &format!("Le Guin {}", writer % 2),
                "Science Fiction",
                "Ace",
            );
            tasks.spawn(async move { services.catalog.add_book(&details).await });
        }

        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap();
            assert!(result.is_ok(), "add_book failed: {:?}", result.err());
        }
    }

    // Two titles per round, every natural key stored once
    let books = services.catalog.list_books().await.unwrap();
    assert_eq!(books.len(), 10);
    assert!(books.iter().all(|b| b.genre.as_deref() == Some("Science Fiction")));

    let mut conn = pool.acquire().await.unwrap();
    let repo = Repository::new(pool.clone());
    assert_eq!(repo.genres.count(&mut conn).await.unwrap(), 1);
    assert_eq!(repo.publishers.count(&mut conn).await.unwrap(), 1);
    assert_eq!(repo.authors.count(&mut conn).await.unwrap(), 2);
}
