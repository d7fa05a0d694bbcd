//! Remote API client against the in-process fake.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use shopfloor_admin::api::{
    ApiClient, ApiError, ClientQuery, OrderDraft, OrderLine, ProductQuery,
};
use shopfloor_core::{CategoryId, ClientId, ProductId};
use shopfloor_integration_tests::{FakeRemote, RemoteData};

fn products(page: u32, search: Option<&str>, category: Option<i64>) -> ProductQuery {
    ProductQuery {
        page,
        per_page: 2,
        search: search.map(str::to_string),
        category: category.map(CategoryId::new),
    }
}

async fn setup() -> (FakeRemote, ApiClient) {
    let remote = FakeRemote::start(RemoteData::sample()).await;
    let client = ApiClient::new(&remote.api_config()).unwrap();
    (remote, client)
}

#[tokio::test]
async fn test_list_products_paginates() {
    let (_remote, client) = setup().await;

    let first = client.list_products(&products(1, None, None)).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.page, 1);
    assert_eq!(first.last_page, 3);
    assert_eq!(first.total, Some(5));
    assert!(first.has_more());

    let last = client.list_products(&products(3, None, None)).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].name, "Coffee Mug");
    assert!(!last.has_more());
}

#[tokio::test]
async fn test_list_products_filters_by_category_and_search() {
    let (_remote, client) = setup().await;

    let tea = client.list_products(&products(1, None, Some(2))).await.unwrap();
    let names: Vec<_> = tea.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Green Tea", "Chai Tea"]);

    let coffee = client
        .list_products(&products(1, Some("COFFEE"), None))
        .await
        .unwrap();
    let names: Vec<_> = coffee.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Slow Roast Coffee", "Coffee Mug"]);
    assert_eq!(coffee.items[0].price, Decimal::new(1500, 2));
    assert_eq!(coffee.items[0].category.as_deref(), Some("Coffee"));
}

#[tokio::test]
async fn test_empty_search_is_not_sent() {
    let (remote, client) = setup().await;

    let page = client.list_products(&products(1, Some(""), None)).await.unwrap();

    assert_eq!(page.total, Some(5));
    let requests = remote.data().requests.clone();
    assert_eq!(requests, ["GET /products?page=1&per_page=2"]);
}

#[tokio::test]
async fn test_list_clients_searches() {
    let (_remote, client) = setup().await;

    let query = ClientQuery {
        page: 1,
        per_page: 10,
        search: Some("bruno".to_string()),
    };
    let page = client.list_clients(&query).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, ClientId::new(2));
    assert_eq!(page.items[0].email.as_deref(), Some("bruno@example.com"));
}

#[tokio::test]
async fn test_categories_are_cached_until_invalidated() {
    let (remote, client) = setup().await;

    let first = client.list_categories().await.unwrap();
    assert_eq!(first.len(), 2);

    remote.data().categories.pop();
    let cached = client.list_categories().await.unwrap();
    assert_eq!(cached.len(), 2);

    client.invalidate_categories().await;
    let fresh = client.list_categories().await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].name, "Coffee");

    let fetches = remote
        .data()
        .requests
        .iter()
        .filter(|r| r.as_str() == "GET /categories")
        .count();
    assert_eq!(fetches, 2);
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let remote = FakeRemote::start(RemoteData::sample()).await;
    let client = ApiClient::new(&remote.api_config_with_token("wrong-token-aZ81")).unwrap();

    let err = client.list_categories().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Unauthenticated."));
    assert_eq!(
        err.user_message(),
        "The back office is not authorized to do that."
    );
}

#[tokio::test]
async fn test_unknown_product_photos_not_found() {
    let (_remote, client) = setup().await;

    let err = client.list_photos(ProductId::new(999)).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let (remote, client) = setup().await;
    remote.data().rate_limit_next = Some(7);

    let err = client.list_products(&products(1, None, None)).await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));

    // Only the next request is limited
    assert!(client.list_products(&products(1, None, None)).await.is_ok());
}

#[tokio::test]
async fn test_bad_request_is_not_a_validation_error() {
    let (remote, client) = setup().await;
    remote.data().fail_next = Some((StatusCode::BAD_REQUEST, "Malformed per_page.".to_string()));

    let err = client.list_products(&products(1, None, None)).await.unwrap_err();

    assert!(
        matches!(err, ApiError::Status { status: 400, ref message } if message == "Malformed per_page.")
    );
    assert_eq!(err.user_message(), "The server could not complete the request.");
}

#[tokio::test]
async fn test_create_order_decrements_stock() {
    let (remote, client) = setup().await;

    let draft = OrderDraft {
        client_id: Some(ClientId::new(1)),
        items: vec![
            OrderLine {
                product_id: ProductId::new(1),
                quantity: 2,
                unit_price: Decimal::new(1250, 2),
            },
            OrderLine {
                product_id: ProductId::new(3),
                quantity: 1,
                unit_price: Decimal::new(800, 2),
            },
        ],
    };
    let receipt = client.create_order(&draft).await.unwrap();

    assert_eq!(receipt.id.as_i64(), 1);
    assert_eq!(receipt.total, Decimal::new(3300, 2));
    assert!(receipt.created_at.is_some());

    let data = remote.data();
    assert_eq!(data.stock_of(ProductId::new(1)), Some(3));
    assert_eq!(data.stock_of(ProductId::new(3)), Some(1));
    assert_eq!(data.orders.len(), 1);
}

#[tokio::test]
async fn test_create_order_validation_error_passes_message_through() {
    let (remote, client) = setup().await;

    let draft = OrderDraft {
        client_id: None,
        items: vec![OrderLine {
            product_id: ProductId::new(3),
            quantity: 5,
            unit_price: Decimal::new(800, 2),
        }],
    };
    let err = client.create_order(&draft).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.user_message(), "Insufficient stock for Green Tea.");
    assert_eq!(remote.data().stock_of(ProductId::new(3)), Some(2));
}
