//! Integration test support for Shopfloor.
//!
//! [`FakeRemote`] serves an in-memory imitation of the remote REST API on an
//! ephemeral port. [`TestApp`] serves the back office against it, so tests
//! can drive the screens with a cookie-keeping HTTP client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfloor-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use shopfloor_admin::api::{Category, Client, OrderDraft, Photo, Product};
use shopfloor_admin::config::{AdminConfig, ApiConfig, PhotoConfig, PosConfig, parse_base_url};
use shopfloor_admin::state::AppState;
use shopfloor_core::{CategoryId, ClientId, CurrencyCode, PhotoId, PhotoStatus, ProductId};

/// Bearer token the fake accepts.
pub const TEST_TOKEN: &str = "fake-remote-token-7Qx2Lm9Vr4";

// =============================================================================
// Fake remote data
// =============================================================================

/// A product plus the category id the fake filters on.
#[derive(Debug, Clone)]
pub struct FakeProduct {
    pub product: Product,
    pub category_id: Option<CategoryId>,
}

/// Everything the fake remote API knows.
#[derive(Debug, Default)]
pub struct RemoteData {
    pub categories: Vec<Category>,
    pub products: Vec<FakeProduct>,
    pub clients: Vec<Client>,
    pub photos: HashMap<ProductId, Vec<Photo>>,
    pub orders: Vec<OrderDraft>,
    pub next_photo_id: i64,
    /// Product searches for this term are answered after the delay.
    pub slow_search: Option<(String, Duration)>,
    /// Product listing pages with this number are answered after the delay.
    pub slow_page: Option<(u32, Duration)>,
    /// Orders are created after this delay.
    pub order_delay: Option<Duration>,
    /// Answer the next request with 429 and this `Retry-After`.
    pub rate_limit_next: Option<u64>,
    /// Answer the next request with this status and message.
    pub fail_next: Option<(StatusCode, String)>,
    /// Answer photo mutations with 500.
    pub fail_photo_mutations: bool,
    /// Method and URI (relative to `/v1`) of every authenticated request.
    pub requests: Vec<String>,
}

impl RemoteData {
    /// A small shop: two categories, five products, three clients and two
    /// photos on product 1.
    #[must_use]
    pub fn sample() -> Self {
        let coffee = Category {
            id: CategoryId::new(1),
            name: "Coffee".to_string(),
        };
        let tea = Category {
            id: CategoryId::new(2),
            name: "Tea".to_string(),
        };

        let product = |id: i64, name: &str, cents: i64, category: Option<&Category>, stock: u32| {
            FakeProduct {
                product: Product {
                    id: ProductId::new(id),
                    name: name.to_string(),
                    price: Decimal::new(cents, 2),
                    category: category.map(|c| c.name.clone()),
                    stock,
                },
                category_id: category.map(|c| c.id),
            }
        };
        let products = vec![
            product(1, "Espresso Beans", 1250, Some(&coffee), 5),
            product(2, "Slow Roast Coffee", 1500, Some(&coffee), 3),
            product(3, "Green Tea", 800, Some(&tea), 2),
            product(4, "Chai Tea", 925, Some(&tea), 0),
            product(5, "Coffee Mug", 600, None, 10),
        ];

        let client = |id: i64, name: &str, email: &str| Client {
            id: ClientId::new(id),
            name: name.to_string(),
            tax_id: None,
            phone: None,
            email: Some(email.to_string()),
        };
        let clients = vec![
            client(1, "Ana Ruiz", "ana@example.com"),
            client(2, "Bruno Diaz", "bruno@example.com"),
            client(3, "Carla Gomez", "carla@example.com"),
        ];

        let photo = |id: i64, name: &str, primary: bool, status: PhotoStatus, position: i32| Photo {
            id: PhotoId::new(id),
            url: format!("https://cdn.example.com/1/{name}"),
            name: name.to_string(),
            is_primary: primary,
            status,
            position,
        };
        let mut photos = HashMap::new();
        photos.insert(
            ProductId::new(1),
            vec![
                photo(10, "front.jpg", true, PhotoStatus::Synced, 1),
                photo(11, "side.jpg", false, PhotoStatus::Temporary, 2),
            ],
        );

        Self {
            categories: vec![coffee, tea],
            products,
            clients,
            photos,
            next_photo_id: 100,
            ..Self::default()
        }
    }

    /// Photo ids of a product in display order.
    #[must_use]
    pub fn photo_order(&self, product_id: ProductId) -> Vec<i64> {
        let mut photos = self.photos.get(&product_id).cloned().unwrap_or_default();
        photos.sort_by_key(|p| p.position);
        photos.iter().map(|p| p.id.as_i64()).collect()
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.products
            .iter()
            .find(|p| p.product.id == product_id)
            .map(|p| p.product.stock)
    }
}

type Shared = Arc<Mutex<RemoteData>>;

// =============================================================================
// Fake remote server
// =============================================================================

/// In-process fake of the remote REST API, served under `/v1/`.
pub struct FakeRemote {
    addr: SocketAddr,
    data: Shared,
}

impl FakeRemote {
    /// Serve `data` on an ephemeral port.
    pub async fn start(data: RemoteData) -> Self {
        let data: Shared = Arc::new(Mutex::new(data));

        let api = Router::new()
            .route("/products", get(list_products))
            .route("/categories", get(list_categories))
            .route("/clients", get(list_clients))
            .route("/orders", post(create_order))
            .route("/products/{id}/photos", get(list_photos).post(upload_photo))
            .route("/products/{id}/photos/order", put(reorder_photos))
            .route("/products/{id}/photos/sync", post(sync_photos))
            .route("/products/{id}/photos/{photo_id}", delete(delete_photo))
            .route("/products/{id}/photos/{photo_id}/primary", post(set_primary))
            .layer(middleware::from_fn_with_state(data.clone(), guard))
            .with_state(data.clone());

        let app = Router::new().nest("/v1", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake remote");
        let addr = listener.local_addr().expect("fake remote address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake remote server");
        });

        Self { addr, data }
    }

    /// Base URL the API client should use.
    #[must_use]
    pub fn base_url(&self) -> Url {
        parse_base_url(&format!("http://{}/v1", self.addr)).expect("fake remote base URL")
    }

    /// Client configuration pointing at this fake.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        self.api_config_with_token(TEST_TOKEN)
    }

    #[must_use]
    pub fn api_config_with_token(&self, token: &str) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            token: SecretString::from(token.to_string()),
            timeout: Duration::from_secs(5),
            category_cache_ttl: Duration::from_secs(60),
        }
    }

    /// Lock the fake's data for inspection or changes.
    pub fn data(&self) -> MutexGuard<'_, RemoteData> {
        self.data.lock().expect("fake remote data lock")
    }
}

fn lock(data: &Shared) -> MutexGuard<'_, RemoteData> {
    data.lock().expect("fake remote data lock")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Bearer-token check, request log and one-shot rate limiting.
async fn guard(State(data): State<Shared>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {TEST_TOKEN}");
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .is_some_and(|v| v.as_bytes() == expected.as_bytes());
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Unauthenticated.");
    }

    let (retry_after, failure) = {
        let mut data = lock(&data);
        data.requests
            .push(format!("{} {}", request.method(), request.uri()));
        (data.rate_limit_next.take(), data.fail_next.take())
    };
    if let Some((status, message)) = failure {
        return error(status, &message);
    }
    if let Some(secs) = retry_after {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        return (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            Json(json!({ "message": "Too Many Attempts." })),
        )
            .into_response();
    }

    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    category_id: Option<i64>,
}

/// Slice one page out of `items` in the paginated envelope.
fn paginate<T: serde::Serialize>(items: &[T], params: &ListParams) -> Response {
    let per_page = params.per_page.unwrap_or(15).max(1) as usize;
    let page = params.page.unwrap_or(1).max(1) as usize;
    let last_page = items.len().div_ceil(per_page).max(1);
    let data: Vec<&T> = items.iter().skip((page - 1) * per_page).take(per_page).collect();

    Json(json!({
        "data": data,
        "meta": {
            "current_page": page,
            "last_page": last_page,
            "total": items.len(),
        }
    }))
    .into_response()
}

fn matches(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

async fn list_products(State(data): State<Shared>, Query(params): Query<ListParams>) -> Response {
    let search = params.search.as_deref().filter(|s| !s.is_empty());

    let (delay, known_category) = {
        let data = lock(&data);
        let search_delay = data
            .slow_search
            .as_ref()
            .filter(|(term, _)| Some(term.as_str()) == search)
            .map(|(_, delay)| *delay);
        let page_delay = data
            .slow_page
            .filter(|(page, _)| params.page.unwrap_or(1) == *page)
            .map(|(_, delay)| delay);
        let known_category = params
            .category_id
            .is_none_or(|id| data.categories.iter().any(|c| c.id == CategoryId::new(id)));
        (search_delay.or(page_delay), known_category)
    };
    if !known_category {
        return error(StatusCode::NOT_FOUND, "Category not found.");
    }
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let products: Vec<Product> = lock(&data)
        .products
        .iter()
        .filter(|p| params.category_id.is_none_or(|id| p.category_id == Some(CategoryId::new(id))))
        .filter(|p| matches(&p.product.name, search))
        .map(|p| p.product.clone())
        .collect();

    paginate(&products, &params)
}

async fn list_categories(State(data): State<Shared>) -> Response {
    let categories = lock(&data).categories.clone();
    Json(json!({ "data": categories })).into_response()
}

async fn list_clients(State(data): State<Shared>, Query(params): Query<ListParams>) -> Response {
    let search = params.search.as_deref().filter(|s| !s.is_empty());
    let clients: Vec<Client> = lock(&data)
        .clients
        .iter()
        .filter(|c| {
            matches(&c.name, search) || matches(c.email.as_deref().unwrap_or_default(), search)
        })
        .cloned()
        .collect();

    paginate(&clients, &params)
}

async fn create_order(State(data): State<Shared>, Json(draft): Json<OrderDraft>) -> Response {
    let delay = lock(&data).order_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let mut data = lock(&data);

    if draft.items.is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The order has no items.");
    }
    if let Some(client_id) = draft.client_id
        && !data.clients.iter().any(|c| c.id == client_id)
    {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The selected client is invalid.");
    }
    for line in &draft.items {
        let Some(product) = data.products.iter().find(|p| p.product.id == line.product_id) else {
            return error(StatusCode::UNPROCESSABLE_ENTITY, "The selected product is invalid.");
        };
        if line.quantity > product.product.stock {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("Insufficient stock for {}.", product.product.name),
            );
        }
    }

    for line in &draft.items {
        if let Some(product) = data
            .products
            .iter_mut()
            .find(|p| p.product.id == line.product_id)
        {
            product.product.stock -= line.quantity;
        }
    }

    let total: Decimal = draft
        .items
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum();
    data.orders.push(draft);
    let id = data.orders.len();

    (
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "id": id,
                "total": total,
                "created_at": chrono::Utc::now(),
            }
        })),
    )
        .into_response()
}

// =============================================================================
// Photos
// =============================================================================

fn known_product(data: &RemoteData, product_id: ProductId) -> bool {
    data.products.iter().any(|p| p.product.id == product_id)
}

async fn list_photos(State(data): State<Shared>, Path(product_id): Path<ProductId>) -> Response {
    let data = lock(&data);
    if !known_product(&data, product_id) {
        return error(StatusCode::NOT_FOUND, "Product not found.");
    }
    let photos = data.photos.get(&product_id).cloned().unwrap_or_default();
    Json(json!({ "data": photos })).into_response()
}

async fn upload_photo(
    State(data): State<Shared>,
    Path(product_id): Path<ProductId>,
    mut multipart: Multipart,
) -> Response {
    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("photo") {
            let name = field.file_name().unwrap_or("photo").to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            upload = Some((name, content_type, size));
        }
    }

    let mut data = lock(&data);
    if !known_product(&data, product_id) {
        return error(StatusCode::NOT_FOUND, "Product not found.");
    }
    if data.fail_photo_mutations {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable.");
    }
    let Some((name, content_type, size)) = upload else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The photo field is required.");
    };
    if !content_type.starts_with("image/") || size == 0 {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The photo must be an image.");
    }

    let id = data.next_photo_id;
    data.next_photo_id += 1;
    let photos = data.photos.entry(product_id).or_default();
    let photo = Photo {
        id: PhotoId::new(id),
        url: format!("https://cdn.example.com/{product_id}/{name}"),
        name,
        is_primary: photos.is_empty(),
        status: PhotoStatus::Temporary,
        position: photos.iter().map(|p| p.position).max().unwrap_or(0) + 1,
    };
    photos.push(photo.clone());

    (StatusCode::CREATED, Json(json!({ "data": photo }))).into_response()
}

async fn delete_photo(
    State(data): State<Shared>,
    Path((product_id, photo_id)): Path<(ProductId, PhotoId)>,
) -> Response {
    let mut data = lock(&data);
    if data.fail_photo_mutations {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable.");
    }
    let photos = data.photos.entry(product_id).or_default();
    let before = photos.len();
    photos.retain(|p| p.id != photo_id);
    if photos.len() == before {
        return error(StatusCode::NOT_FOUND, "Photo not found.");
    }
    if !photos.iter().any(|p| p.is_primary)
        && let Some(first) = photos.iter_mut().min_by_key(|p| p.position)
    {
        first.is_primary = true;
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize)]
struct ReorderBody {
    photo_ids: Vec<PhotoId>,
}

async fn reorder_photos(
    State(data): State<Shared>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<ReorderBody>,
) -> Response {
    let mut data = lock(&data);
    if data.fail_photo_mutations {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable.");
    }
    let photos = data.photos.entry(product_id).or_default();

    let mut current: Vec<PhotoId> = photos.iter().map(|p| p.id).collect();
    let mut proposed = body.photo_ids.clone();
    current.sort_unstable();
    proposed.sort_unstable();
    if current != proposed {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The photo ids do not match.");
    }

    for (position, id) in (1..).zip(&body.photo_ids) {
        if let Some(photo) = photos.iter_mut().find(|p| p.id == *id) {
            photo.position = position;
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn set_primary(
    State(data): State<Shared>,
    Path((product_id, photo_id)): Path<(ProductId, PhotoId)>,
) -> Response {
    let mut data = lock(&data);
    if data.fail_photo_mutations {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable.");
    }
    let photos = data.photos.entry(product_id).or_default();
    if !photos.iter().any(|p| p.id == photo_id) {
        return error(StatusCode::NOT_FOUND, "Photo not found.");
    }
    for photo in photos.iter_mut() {
        photo.is_primary = photo.id == photo_id;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn sync_photos(State(data): State<Shared>, Path(product_id): Path<ProductId>) -> Response {
    let mut data = lock(&data);
    if data.fail_photo_mutations {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable.");
    }
    let mut synced = 0;
    for photo in data.photos.entry(product_id).or_default() {
        if !photo.status.is_synced() {
            photo.status = PhotoStatus::Synced;
            synced += 1;
        }
    }
    Json(json!({ "data": { "synced": synced } })).into_response()
}

// =============================================================================
// Back office under test
// =============================================================================

/// Back-office settings for tests: small pages so pagination is exercised.
#[must_use]
pub fn test_config(api: ApiConfig) -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        api,
        pos: PosConfig {
            page_size: 2,
            client_page_size: 2,
            currency: CurrencyCode::USD,
        },
        photos: PhotoConfig {
            max_upload_bytes: 64 * 1024,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// A running back office plus a client that keeps its session cookie.
pub struct TestApp {
    addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Serve the back office against `remote`.
    pub async fn spawn(remote: &FakeRemote) -> Self {
        Self::spawn_with_config(test_config(remote.api_config())).await
    }

    pub async fn spawn_with_config(config: AdminConfig) -> Self {
        let state = AppState::new(config).expect("app state");
        let app = shopfloor_admin::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind back office");
        let addr = listener.local_addr().expect("back office address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("back office server");
        });

        Self {
            addr,
            client: cookie_client(),
        }
    }

    /// A second operator on the same back office, with their own session.
    #[must_use]
    pub fn another_operator(&self) -> Self {
        Self {
            addr: self.addr,
            client: cookie_client(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a page and return its body, asserting success.
    pub async fn get(&self, path: &str) -> String {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request");
        assert!(
            response.status().is_success(),
            "GET {path} returned {}",
            response.status()
        );
        response.text().await.expect("response body")
    }

    /// POST a form, follow the redirect and return the rendered page.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> String {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request");
        assert!(
            response.status().is_success(),
            "POST {path} returned {}",
            response.status()
        );
        response.text().await.expect("response body")
    }
}

fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Number of times `needle` occurs in `haystack`.
#[must_use]
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
