mod helpers;

use helpers::*;
use price_tracker::error::{AppError, IngestionError};
use price_tracker::services::ExtractionError;
use rust_decimal::Decimal;
use std::sync::Arc;

const URL_A: &str = "https://shop.example/p/a";

/// Add URL A at 500, recheck at 450, history reads newest first
#[tokio::test]
async fn test_add_then_recheck_flow() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    // Step 1: First observation creates the product
    fetcher.set_page(URL_A, product_page("Acme Phone", "A phone", Some("₹500")));
    let added = tracking.add_or_update(URL_A).await.expect("Failed to add product");

    assert!(added.is_new());
    assert_eq!(added.message(), "Product added successfully");
    assert_eq!(added.observed.price, Some(Decimal::new(500, 0)));

    // Step 2: Price drops, recheck records it
    fetcher.set_page(URL_A, product_page("Acme Phone", "A phone", Some("₹450")));
    let rechecked = tracking
        .recheck(added.product_id())
        .await
        .expect("Failed to recheck product");

    assert_eq!(rechecked.product_id, added.product_id());
    assert_eq!(rechecked.new_price, Decimal::new(450, 0));
    assert!(rechecked.price_found);
    assert_eq!(rechecked.message(), "Price updated successfully");

    // Step 3: History is most recent first
    let prices: Vec<Decimal> = db
        .product_repo
        .get_history(added.product_id())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.price)
        .collect();
    assert_eq!(prices, vec![Decimal::new(450, 0), Decimal::new(500, 0)]);

    db.cleanup().await;
}

#[tokio::test]
async fn test_add_same_url_twice_keeps_one_product() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    fetcher.set_page(URL_A, product_page("Kettle", "", Some("₹1,234.50")));
    let first = tracking.add_or_update(URL_A).await.unwrap();
    let second = tracking.add_or_update(URL_A).await.unwrap();

    assert!(first.is_new());
    assert!(!second.is_new());
    assert_eq!(second.message(), "Product already existed. Price updated.");
    assert_eq!(first.product_id(), second.product_id());
    assert_eq!(db.product_repo.count().await.unwrap(), 1);

    let product = db.product_repo.find_by_url(URL_A).await.unwrap().unwrap();
    assert_eq!(product.current_price, Decimal::new(123450, 2));

    db.cleanup().await;
}

#[tokio::test]
async fn test_history_grows_with_each_observation() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    fetcher.set_page(URL_A, product_page("Toaster", "", Some("₹100")));
    let product_id = tracking.add_or_update(URL_A).await.unwrap().product_id();

    for price in 101..105 {
        fetcher.set_page(URL_A, product_page("Toaster", "", Some(&format!("₹{}", price))));
        tracking.recheck(product_id).await.unwrap();
    }

    let history = db.product_repo.get_history(product_id).await.unwrap();
    assert_eq!(history.len(), 5);
    for pair in history.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
    assert_eq!(history[0].price, Decimal::new(104, 0));
    assert_eq!(history[4].price, Decimal::new(100, 0));

    db.cleanup().await;
}

#[tokio::test]
async fn test_recheck_unknown_product_is_not_found() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    let err = tracking.recheck(42).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), 404);
    assert_eq!(fetcher.calls(), 0);

    // History lookups for the same id are simply empty
    assert!(db.product_repo.get_history(42).await.unwrap().is_empty());

    db.cleanup().await;
}

#[tokio::test]
async fn test_fetch_failure_commits_nothing() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    let err = tracking.add_or_update(URL_A).await.unwrap_err();
    match &err {
        AppError::Ingestion(cause) => {
            assert_eq!(cause.cause_tag(), "fetch");
            match cause {
                IngestionError::Fetch(fetch) => assert_eq!(fetch.url, URL_A),
                other => panic!("expected fetch failure, got {:?}", other),
            }
        }
        other => panic!("expected ingestion failure, got {:?}", other),
    }

    assert_eq!(db.table_count("products").await, 0);
    assert_eq!(db.table_count("price_history").await, 0);

    db.cleanup().await;
}

#[tokio::test]
async fn test_extraction_failure_commits_nothing() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    fetcher.set_page(URL_A, product_page("Broken", "", Some("Currently unavailable")));
    let err = tracking.add_or_update(URL_A).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Ingestion(IngestionError::Extraction(ExtractionError::MalformedPrice { .. }))
    ));
    assert_eq!(err.status_code(), 502);
    assert_eq!(db.table_count("products").await, 0);
    assert_eq!(db.table_count("price_history").await, 0);

    db.cleanup().await;
}

#[tokio::test]
async fn test_failed_recheck_leaves_product_unchanged() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    fetcher.set_page(URL_A, product_page("Lamp", "", Some("₹500")));
    let product_id = tracking.add_or_update(URL_A).await.unwrap().product_id();
    let before = db.product_repo.find_by_id(product_id).await.unwrap().unwrap();

    fetcher.remove_page(URL_A);
    let err = tracking.recheck(product_id).await.unwrap_err();
    assert!(matches!(err, AppError::Ingestion(IngestionError::Fetch(_))));

    let after = db.product_repo.find_by_id(product_id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(db.product_repo.count_history(product_id).await.unwrap(), 1);

    db.cleanup().await;
}

#[tokio::test]
async fn test_page_without_price_records_zero_sentinel() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = tracking_service(&db, fetcher.clone());

    fetcher.set_page(URL_A, "<html><body><p>Coming soon</p></body></html>".to_string());
    let added = tracking.add_or_update(URL_A).await.unwrap();

    assert!(added.is_new());
    assert!(!added.observed.has_price());

    let product = db.product_repo.find_by_id(added.product_id()).await.unwrap().unwrap();
    assert_eq!(product.title, "Unknown Title");
    assert_eq!(product.description, "");
    assert_eq!(product.current_price, Decimal::ZERO);

    fetcher.set_page(URL_A, "<html><body></body></html>".to_string());
    let rechecked = tracking.recheck(added.product_id()).await.unwrap();
    assert!(!rechecked.price_found);
    assert_eq!(rechecked.new_price, Decimal::ZERO);

    db.cleanup().await;
}

#[tokio::test]
async fn test_concurrent_adds_for_new_url_create_one_product() {
    let db = TestDatabase::new().await;
    let fetcher = StubFetcher::new();
    let tracking = Arc::new(tracking_service(&db, fetcher.clone()));

    fetcher.set_page(URL_A, product_page("Racer", "", Some("₹300")));

    let (a, b) = tokio::join!(tracking.add_or_update(URL_A), tracking.add_or_update(URL_A));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.product_id(), b.product_id());
    assert_eq!([a.is_new(), b.is_new()].iter().filter(|n| **n).count(), 1);
    assert_eq!(db.table_count("products").await, 1);
    assert_eq!(db.product_repo.count_history(a.product_id()).await.unwrap(), 2);

    db.cleanup().await;
}
