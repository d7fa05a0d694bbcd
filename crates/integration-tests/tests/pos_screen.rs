//! Back-office screens driven over HTTP against the fake remote API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use shopfloor_core::{ClientId, ProductId};
use shopfloor_integration_tests::{FakeRemote, RemoteData, TestApp, count, test_config};

async fn setup() -> (FakeRemote, TestApp) {
    let remote = FakeRemote::start(RemoteData::sample()).await;
    let app = TestApp::spawn(&remote).await;
    (remote, app)
}

fn set_stock(remote: &FakeRemote, product_id: i64, stock: u32) {
    let mut data = remote.data();
    let product = data
        .products
        .iter_mut()
        .find(|p| p.product.id == ProductId::new(product_id))
        .unwrap();
    product.product.stock = stock;
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_pos_screen_loads_first_pages() {
    let (_remote, app) = setup().await;

    let body = app.get("/pos").await;

    assert_eq!(count(&body, "product-card"), 2);
    assert!(body.contains("Espresso Beans"));
    assert!(body.contains("Slow Roast Coffee"));
    assert!(body.contains("Load more"));
    assert!(body.contains(">Coffee</button>"));
    assert!(body.contains(">Tea</button>"));
    assert_eq!(count(&body, "client-result"), 2);
    assert!(body.contains("More clients"));
    assert!(body.contains("The cart is empty."));
}

#[tokio::test]
async fn test_root_redirects_to_pos() {
    let (_remote, app) = setup().await;

    let body = app.get("/").await;

    assert!(body.contains("product-grid"));
}

#[tokio::test]
async fn test_load_more_appends_until_exhausted() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.post_form("/pos/more", &[]).await;
    assert_eq!(count(&body, "product-card"), 4);

    let body = app.post_form("/pos/more", &[]).await;
    assert_eq!(count(&body, "product-card"), 5);
    assert!(body.contains("Coffee Mug"));
    assert!(!body.contains("Load more"));
}

#[tokio::test]
async fn test_category_resets_grid() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/more", &[]).await;

    let body = app.post_form("/pos/category", &[("category", "2")]).await;

    assert_eq!(count(&body, "product-card"), 2);
    assert!(body.contains("Green Tea"));
    assert!(body.contains("Chai Tea"));
    assert!(!body.contains("Espresso Beans"));
    assert!(body.contains("Out of stock"));
}

#[tokio::test]
async fn test_unknown_category_value() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.post_form("/pos/category", &[("category", "tea")]).await;

    assert!(body.contains("Unknown category."));
}

#[tokio::test]
async fn test_vanished_category_falls_back_to_all() {
    let remote = FakeRemote::start(RemoteData::sample()).await;
    let mut api = remote.api_config();
    api.category_cache_ttl = Duration::from_millis(50);
    let app = TestApp::spawn_with_config(test_config(api)).await;
    app.post_form("/pos/category", &[("category", "2")]).await;

    remote.data().categories.retain(|c| c.name != "Tea");
    tokio::time::sleep(Duration::from_millis(150)).await;
    let body = app.get("/pos").await;

    assert!(body.contains("The selected category no longer exists; showing all products."));
    assert!(!body.contains(">Tea</button>"));
    assert!(body.contains("Espresso Beans"));
}

#[tokio::test]
async fn test_refused_category_refreshes_category_list() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/category", &[("category", "2")]).await;

    // The cached category list still has Tea; the product listing does not
    remote.data().categories.retain(|c| c.name != "Tea");
    let body = app.post_form("/pos/search", &[("q", "green")]).await;

    assert!(body.contains("The selected category no longer exists; showing all products."));
    assert!(!body.contains(">Tea</button>"));
    let fetches = remote
        .data()
        .requests
        .iter()
        .filter(|r| r.as_str() == "GET /categories")
        .count();
    assert_eq!(fetches, 2);
}

#[tokio::test]
async fn test_render_keeps_page_in_flight() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    remote.data().slow_page = Some((2, Duration::from_millis(400)));

    let (_, during) = tokio::join!(app.post_form("/pos/more", &[]), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        app.post_form("/pos/more", &[]).await
    });
    assert!(during.contains("The next page is still loading; try again shortly."));

    let body = app.get("/pos").await;
    assert_eq!(count(&body, "product-card"), 4);
}

#[tokio::test]
async fn test_search_filters_products() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.post_form("/pos/search", &[("q", "tea")]).await;

    assert_eq!(count(&body, "product-card"), 2);
    assert!(body.contains("Green Tea"));
    assert!(body.contains(r#"value="tea""#));
    assert!(!body.contains("Load more"));
}

#[tokio::test]
async fn test_superseded_search_is_dropped() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    remote.data().slow_search = Some(("coffee".to_string(), Duration::from_millis(600)));

    let slow = app.post_form("/pos/search", &[("q", "coffee")]);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        app.post_form("/pos/search", &[("q", "tea")]).await
    };
    tokio::join!(slow, fast);

    let body = app.get("/pos").await;
    assert!(body.contains("Green Tea"));
    assert!(body.contains("Chai Tea"));
    assert!(!body.contains("Slow Roast Coffee"));
    assert!(!body.contains("Coffee Mug"));
    assert_eq!(count(&body, "product-card"), 2);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_respects_stock() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/category", &[("category", "2")]).await;

    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;
    let body = app.post_form("/pos/cart/add", &[("product_id", "3")]).await;

    assert!(body.contains("Only 2 of Green Tea in stock."));
    assert_eq!(count(&body, "cart-line"), 1);
    assert!(body.contains(r#"<span class="quantity">2</span>"#));
    assert!(body.contains(r#"<span id="cart-total">$16.00</span>"#));

    let body = app.post_form("/pos/cart/add", &[("product_id", "4")]).await;
    assert!(body.contains("Chai Tea is out of stock."));
}

#[tokio::test]
async fn test_cart_rejects_unlisted_product() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.post_form("/pos/cart/add", &[("product_id", "5")]).await;

    assert!(body.contains("That product is not in the current list."));
    assert!(body.contains("The cart is empty."));
}

#[tokio::test]
async fn test_cart_update_and_remove() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;

    let body = app
        .post_form("/pos/cart/update", &[("product_id", "1"), ("quantity", "4")])
        .await;
    assert!(body.contains(r#"<span id="cart-total">$50.00</span>"#));

    let body = app
        .post_form("/pos/cart/update", &[("product_id", "1"), ("quantity", "9")])
        .await;
    assert!(body.contains("Only 5 of Espresso Beans in stock."));
    assert!(body.contains(r#"<span class="quantity">4</span>"#));

    let body = app.post_form("/pos/cart/remove", &[("product_id", "1")]).await;
    assert!(body.contains("The cart is empty."));

    let body = app.post_form("/pos/cart/remove", &[("product_id", "1")]).await;
    assert!(body.contains("That product is no longer in the cart."));
}

#[tokio::test]
async fn test_refetch_clamps_cart_to_new_stock() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/category", &[("category", "2")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;

    set_stock(&remote, 3, 1);
    let body = app.post_form("/pos/category", &[("category", "2")]).await;

    assert!(body.contains("Stock for Green Tea changed to 1; the cart was adjusted."));
    assert!(body.contains(r#"<span class="quantity">1</span>"#));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_empty_cart() {
    let (remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.post_form("/pos/checkout", &[]).await;

    assert!(body.contains("Add products to the cart before checking out."));
    assert!(remote.data().orders.is_empty());
}

#[tokio::test]
async fn test_checkout_for_selected_client() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;

    let body = app
        .post_form("/pos/clients/select", &[("client_id", "1")])
        .await;
    assert!(body.contains("Selling to Ana Ruiz."));
    assert!(body.contains("selected-client"));

    let body = app.post_form("/pos/checkout", &[]).await;

    assert!(body.contains("Order #1 created, total $25.00."));
    assert!(body.contains("The cart is empty."));
    assert!(!body.contains("selected-client"));

    let data = remote.data();
    assert_eq!(data.orders.len(), 1);
    assert_eq!(data.orders[0].client_id, Some(ClientId::new(1)));
    assert_eq!(data.orders[0].items[0].quantity, 2);
    assert_eq!(data.stock_of(ProductId::new(1)), Some(3));
}

#[tokio::test]
async fn test_walk_in_checkout_has_no_client() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "2")]).await;

    let body = app.post_form("/pos/checkout", &[]).await;

    assert!(body.contains("Order #1 created, total $15.00."));
    assert_eq!(remote.data().orders[0].client_id, None);
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/category", &[("category", "2")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;
    app.post_form("/pos/cart/add", &[("product_id", "3")]).await;

    set_stock(&remote, 3, 1);
    let body = app.post_form("/pos/checkout", &[]).await;

    assert!(body.contains("Checkout failed: Insufficient stock for Green Tea."));
    assert_eq!(count(&body, "cart-line"), 1);
    assert!(remote.data().orders.is_empty());
}

#[tokio::test]
async fn test_concurrent_checkouts_place_one_order() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;
    remote.data().order_delay = Some(Duration::from_millis(300));

    let (first, second) = tokio::join!(app.post_form("/pos/checkout", &[]), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.post_form("/pos/checkout", &[]).await
    });

    assert!(first.contains("Order #1 created, total $12.50."));
    assert!(second.contains("This cart is already being checked out; wait for the result."));
    let data = remote.data();
    assert_eq!(data.orders.len(), 1);
    assert_eq!(data.stock_of(ProductId::new(1)), Some(4));
}

#[tokio::test]
async fn test_checkout_marker_cleared_after_failure() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;

    remote.data().fail_next = Some((StatusCode::SERVICE_UNAVAILABLE, "Down.".to_string()));
    let body = app.post_form("/pos/checkout", &[]).await;
    assert!(body.contains("Checkout failed"));

    let body = app.post_form("/pos/checkout", &[]).await;
    assert!(body.contains("Order #1 created, total $12.50."));
}

#[tokio::test]
async fn test_item_added_during_checkout_stays_in_cart() {
    let (remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;
    remote.data().order_delay = Some(Duration::from_millis(300));

    let (_, _) = tokio::join!(app.post_form("/pos/checkout", &[]), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        app.post_form("/pos/cart/add", &[("product_id", "2")]).await
    });

    let ordered: Vec<i64> = remote.data().orders[0]
        .items
        .iter()
        .map(|line| line.product_id.as_i64())
        .collect();
    assert_eq!(ordered, [1]);

    let body = app.get("/pos").await;
    assert_eq!(count(&body, "cart-line"), 1);
    assert!(body.contains(r#"data-product-id="2""#));
    assert!(body.contains(r#"<span id="cart-total">$15.00</span>"#));
}

// =============================================================================
// Client picker
// =============================================================================

#[tokio::test]
async fn test_client_search_fragment() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let response = app
        .client
        .get(app.url("/pos/clients?q=carla"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fragment = response.text().await.unwrap();

    assert!(fragment.trim_start().starts_with(r#"<section id="client-picker""#));
    assert!(!fragment.contains("<html"));
    assert_eq!(count(&fragment, "client-result"), 1);
    assert!(fragment.contains("Carla Gomez"));
}

#[tokio::test]
async fn test_client_search_without_htmx_redirects() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app.get("/pos/clients?q=bruno").await;

    assert!(body.contains("<html"));
    assert!(body.contains("Bruno Diaz"));
    assert!(!body.contains("Ana Ruiz"));
}

#[tokio::test]
async fn test_client_more_and_selection_rules() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;

    let body = app
        .post_form("/pos/clients/select", &[("client_id", "3")])
        .await;
    assert!(body.contains("That client is not in the current results."));

    let body = app.post_form("/pos/clients/more", &[]).await;
    assert_eq!(count(&body, "client-result"), 3);
    assert!(!body.contains("More clients"));

    let body = app
        .post_form("/pos/clients/select", &[("client_id", "3")])
        .await;
    assert!(body.contains("Selling to Carla Gomez."));

    let body = app.post_form("/pos/clients/clear", &[]).await;
    assert!(body.contains("Walk-in sale."));
}

#[tokio::test]
async fn test_operators_do_not_share_carts() {
    let (_remote, app) = setup().await;
    app.get("/pos").await;
    app.post_form("/pos/cart/add", &[("product_id", "1")]).await;

    let other = app.another_operator();
    let body = other.get("/pos").await;

    assert!(body.contains("The cart is empty."));
}

// =============================================================================
// Photos
// =============================================================================

fn image(name: &str, mime: &str, bytes: Vec<u8>) -> Form {
    let part = Part::bytes(bytes).file_name(name.to_string()).mime_str(mime).unwrap();
    Form::new().part("photo", part)
}

async fn upload(app: &TestApp, form: Form) -> String {
    let response = app
        .client
        .post(app.url("/products/1/photos"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await.unwrap()
}

#[tokio::test]
async fn test_photo_gallery_page() {
    let (_remote, app) = setup().await;

    let body = app.get("/products/1/photos").await;

    assert!(body.contains("front.jpg"));
    assert!(body.contains("side.jpg"));
    assert!(body.contains("Sync to store (1 pending)"));
    assert!(body.contains(r#"value="10,11""#));
    assert!(body.contains("Up to 64 KB"));
}

#[tokio::test]
async fn test_unknown_product_gallery_is_404() {
    let (_remote, app) = setup().await;

    let response = app
        .client
        .get(app.url("/products/999/photos"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photo_upload() {
    let (remote, app) = setup().await;

    let body = upload(&app, image("new.png", "image/png", vec![0x89, b'P', b'N', b'G'])).await;

    assert!(body.contains("Uploaded new.png."));
    assert!(body.contains(r#"value="10,11,100""#));
    assert_eq!(remote.data().photo_order(ProductId::new(1)), [10, 11, 100]);
}

#[tokio::test]
async fn test_photo_upload_rejected_locally() {
    let (remote, app) = setup().await;

    let body = upload(&app, image("notes.txt", "text/plain", b"hello".to_vec())).await;
    assert!(body.contains("Upload rejected: text/plain files are not supported"));

    let body = upload(&app, image("big.jpg", "image/jpeg", vec![0; 70 * 1024])).await;
    assert!(body.contains("Upload rejected: the file is 71680 bytes; the limit is 65536 bytes."));

    assert_eq!(remote.data().photo_order(ProductId::new(1)), [10, 11]);
}

#[tokio::test]
async fn test_photo_reorder_and_sync() {
    let (remote, app) = setup().await;
    app.get("/products/1/photos").await;

    let body = app
        .post_form("/products/1/photos/order", &[("order", "11,10")])
        .await;
    assert!(body.contains("Photo order saved."));
    assert_eq!(remote.data().photo_order(ProductId::new(1)), [11, 10]);

    let body = app
        .post_form("/products/1/photos/order", &[("order", "11,x")])
        .await;
    assert!(body.contains("The photo order could not be read."));

    let body = app
        .post_form("/products/1/photos/10/move", &[("direction", "up")])
        .await;
    assert!(body.contains("Photo order saved."));
    assert_eq!(remote.data().photo_order(ProductId::new(1)), [10, 11]);

    let body = app.post_form("/products/1/photos/sync", &[]).await;
    assert!(body.contains("Synced 1 photo(s)."));
    assert!(body.contains("Sync to store (0 pending)"));
}

#[tokio::test]
async fn test_photo_primary_and_delete() {
    let (_remote, app) = setup().await;

    let body = app.post_form("/products/1/photos/11/primary", &[]).await;
    assert!(body.contains("Primary photo updated."));

    let body = app.post_form("/products/1/photos/11/delete", &[]).await;
    assert!(body.contains("Photo deleted."));
    assert!(!body.contains("side.jpg"));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let (remote, app) = setup().await;

    assert_eq!(app.get("/health").await, "ok");

    let ready = app.client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    remote.data().rate_limit_next = Some(30);
    let ready = app.client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}
