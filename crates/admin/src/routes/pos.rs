//! POS screen route handlers.
//!
//! The screen is a product grid filtered by a category strip and a search
//! box, a cart, and the client picker. Product pages are fetched outside the
//! workspace lock; [`fetch_products`] applies a page only if its query is
//! still current.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfloor_core::{CurrencyCode, Price, ProductId};

use super::clients::{ClientPickerView, fetch_clients};
use super::{flash, workspace};
use crate::api::{ApiError, Product};
use crate::error::AppError;
use crate::filters;
use crate::models::{Notice, session::take_notices};
use crate::pos::{
    Cart, CartError, CategoryFilter, CheckoutError, PosState, Workspace, drag_scroll,
};
use crate::state::AppState;

/// Path of the POS screen.
pub const POS_PATH: &str = "/pos";

// =============================================================================
// Views
// =============================================================================

/// One entry of the category strip.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub value: String,
    pub name: String,
    pub active: bool,
}

/// Product card for the grid.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub category: Option<String>,
    pub stock: u32,
    pub in_cart: u32,
    pub can_add: bool,
}

impl ProductCardView {
    fn new(product: &Product, cart: &Cart, currency: CurrencyCode) -> Self {
        let in_cart = cart.quantity_of(product.id);
        Self {
            id: product.id,
            name: product.name.clone(),
            price: Price::new(product.price, currency).display(),
            category: product.category.clone(),
            stock: product.stock,
            in_cart,
            can_add: in_cart < product.stock,
        }
    }
}

/// Cart line for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub subtotal: String,
    pub stock: u32,
    pub can_increment: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product.id,
                    name: line.product.name.clone(),
                    unit_price: Price::new(line.product.price, currency).display(),
                    quantity: line.quantity,
                    subtotal: Price::new(line.subtotal(), currency).display(),
                    stock: line.product.stock,
                    can_increment: line.can_increment(),
                })
                .collect(),
            total: cart.total_price(currency).display(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Settings for the drag-to-scroll category strip script.
#[derive(Debug, Clone, Copy)]
pub struct DragStripView {
    pub speed: f64,
    pub threshold: f64,
}

impl Default for DragStripView {
    fn default() -> Self {
        Self {
            speed: drag_scroll::DEFAULT_SPEED,
            threshold: drag_scroll::DRAG_THRESHOLD_PX,
        }
    }
}

/// POS page template.
#[derive(Template, WebTemplate)]
#[template(path = "pos/index.html")]
pub struct PosIndexTemplate {
    pub current_path: String,
    pub notices: Vec<Notice>,
    pub categories: Vec<CategoryView>,
    pub search: String,
    pub products: Vec<ProductCardView>,
    pub has_more: bool,
    pub cart: CartView,
    pub clients: ClientPickerView,
    pub drag: DragStripView,
}

impl PosIndexTemplate {
    fn new(pos: &PosState, currency: CurrencyCode, notices: Vec<Notice>) -> Self {
        let active = pos.catalog.filter();
        Self {
            current_path: POS_PATH.to_string(),
            notices,
            categories: pos
                .catalog
                .category_options()
                .into_iter()
                .map(|option| CategoryView {
                    value: option.filter.form_value(),
                    active: option.filter == active,
                    name: option.name,
                })
                .collect(),
            search: pos.catalog.search().to_string(),
            products: pos
                .catalog
                .products()
                .iter()
                .map(|p| ProductCardView::new(p, &pos.cart, currency))
                .collect(),
            has_more: pos.catalog.has_more(),
            cart: CartView::new(&pos.cart, currency),
            clients: ClientPickerView::new(&pos.clients, Vec::new()),
            drag: DragStripView::default(),
        }
    }
}

// =============================================================================
// Fetching
// =============================================================================

/// Fetch the next product page and apply it unless a newer query replaced
/// the one it was requested for.
///
/// Cart lines are re-checked against the fetched stock.
async fn fetch_products(state: &AppState, ws: &Workspace) -> Vec<Notice> {
    let Some((ticket, query)) = ws.lock().await.catalog.load_more() else {
        return Vec::new();
    };

    let result = state.api().list_products(&query).await;

    let mut pos = ws.lock().await;
    match result {
        Ok(page) => {
            let fetched = page.items.clone();
            if !pos.catalog.apply_page(ticket, page) {
                return Vec::new();
            }
            let mut notices = Vec::new();
            for product in &fetched {
                if pos.cart.sync_stock(product) {
                    notices.push(Notice::error(format!(
                        "Stock for {} changed to {}; the cart was adjusted.",
                        product.name, product.stock
                    )));
                }
            }
            notices
        }
        Err(e) => {
            pos.catalog.fail(ticket);
            drop(pos);
            // A filtered query the API refuses usually means the category is gone
            if query.category.is_some()
                && matches!(e, ApiError::NotFound(_) | ApiError::Validation(_))
            {
                state.api().invalidate_categories().await;
            }
            tracing::warn!(error = %e, page = ticket.page, "Failed to load products");
            vec![Notice::error(format!(
                "Could not load products: {}",
                e.user_message()
            ))]
        }
    }
}

fn checkout_notice(error: &CheckoutError) -> Notice {
    match error {
        CheckoutError::InProgress => {
            Notice::error("This cart is already being checked out; wait for the result.")
        }
        CheckoutError::Cart(e) => cart_notice(e),
    }
}

fn cart_notice(error: &CartError) -> Notice {
    Notice::error(match error {
        CartError::OutOfStock { name } => format!("{name} is out of stock."),
        CartError::StockExceeded { name, available } => {
            format!("Only {available} of {name} in stock.")
        }
        CartError::NotInCart(_) => "That product is no longer in the cart.".to_string(),
        CartError::Empty => "Add products to the cart before checking out.".to_string(),
    })
}

fn back() -> Redirect {
    Redirect::to(POS_PATH)
}

// =============================================================================
// Handlers
// =============================================================================

/// POS screen.
///
/// Loads categories, the first product page and the first client page when
/// the workspace has none yet.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<PosIndexTemplate, AppError> {
    let ws = workspace(&state, &session).await?;
    let mut notices = take_notices(&session).await?;

    match state.api().list_categories().await {
        Ok(categories) => {
            let mut pos = ws.lock().await;
            if pos.catalog.set_categories(categories.as_ref().clone()).is_some() {
                notices.push(Notice::error(
                    "The selected category no longer exists; showing all products.",
                ));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            notices.push(Notice::error(format!(
                "Could not load categories: {}",
                e.user_message()
            )));
        }
    }

    let (needs_products, needs_clients) = {
        let mut pos = ws.lock().await;
        // An empty list is refetched right away, superseding whatever first
        // page request was left behind. Pages in flight for a non-empty list
        // still land.
        if pos.catalog.products().is_empty() {
            pos.catalog.abandon_in_flight();
        }
        if pos.clients.results().is_empty() {
            pos.clients.abandon_in_flight();
        }
        (
            pos.catalog.products().is_empty() && pos.catalog.has_more(),
            pos.clients.results().is_empty() && pos.clients.has_more(),
        )
    };
    if needs_products {
        notices.extend(fetch_products(&state, &ws).await);
    }
    if needs_clients {
        notices.extend(fetch_clients(&state, &ws).await);
    }

    let pos = ws.lock().await;
    Ok(PosIndexTemplate::new(
        &pos,
        state.config().pos.currency,
        notices,
    ))
}

/// Category form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub category: String,
}

/// Select a category. The grid starts over from page 1.
#[instrument(skip(state, session))]
pub async fn select_category(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    let Some(filter) = CategoryFilter::parse(&form.category) else {
        flash(&session, [Notice::error("Unknown category.")]).await?;
        return Ok(back());
    };

    let ws = workspace(&state, &session).await?;
    ws.lock().await.catalog.select_category(filter);
    flash(&session, fetch_products(&state, &ws).await).await?;
    Ok(back())
}

/// Search form data.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

/// Set the search text. Unchanged text does not refetch.
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SearchForm>,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    let changed = ws.lock().await.catalog.set_search(&form.q).is_some();
    if changed {
        flash(&session, fetch_products(&state, &ws).await).await?;
    }
    Ok(back())
}

/// Load the next product page.
#[instrument(skip(state, session))]
pub async fn more(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    if ws.lock().await.catalog.is_loading() {
        flash(
            &session,
            [Notice::error("The next page is still loading; try again shortly.")],
        )
        .await?;
        return Ok(back());
    }
    flash(&session, fetch_products(&state, &ws).await).await?;
    Ok(back())
}

/// Product form data.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: ProductId,
}

/// Quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Add one unit of a listed product to the cart.
#[instrument(skip(state, session))]
pub async fn cart_add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    let notice = {
        let mut pos = ws.lock().await;
        match pos.catalog.product(form.product_id).cloned() {
            Some(product) => pos.cart.add(&product).err().map(|e| cart_notice(&e)),
            None => Some(Notice::error("That product is not in the current list.")),
        }
    };
    flash(&session, notice).await?;
    Ok(back())
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(state, session))]
pub async fn cart_update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    let result = ws
        .lock()
        .await
        .cart
        .set_quantity(form.product_id, form.quantity);
    flash(&session, result.err().map(|e| cart_notice(&e))).await?;
    Ok(back())
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn cart_remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    let result = ws.lock().await.cart.remove(form.product_id);
    flash(&session, result.err().map(|e| cart_notice(&e))).await?;
    Ok(back())
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn cart_clear(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    ws.lock().await.cart.clear();
    Ok(back())
}

/// Submit the cart as an order for the selected client (if any).
///
/// The workspace is marked while the order is in flight so a second submit
/// of the same cart is refused. On success only the sold units leave the
/// cart and the grid is refetched so stock reflects the sale. On failure the
/// cart is kept.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    // A marker outliving two request timeouts was left by a dropped request
    let stale_after = TimeDelta::from_std(state.config().api.timeout)
        .unwrap_or_else(|_| TimeDelta::hours(1))
        * 2;
    let draft = ws.lock().await.begin_checkout(Utc::now(), stale_after);
    let draft = match draft {
        Ok(draft) => draft,
        Err(e) => {
            flash(&session, [checkout_notice(&e)]).await?;
            return Ok(back());
        }
    };

    let result = state.api().create_order(&draft).await;

    let notice = {
        let mut pos = ws.lock().await;
        match result {
            Ok(receipt) => {
                pos.finish_sale(&draft);
                tracing::info!(order_id = %receipt.id, lines = draft.items.len(), "Sale completed");
                Notice::success(format!(
                    "Order #{} created, total {}.",
                    receipt.id,
                    Price::new(receipt.total, state.config().pos.currency)
                ))
            }
            Err(e) => {
                pos.abort_checkout();
                tracing::warn!(error = %e, "Checkout failed");
                Notice::error(format!("Checkout failed: {}", e.user_message()))
            }
        }
    };

    flash(&session, [notice]).await?;
    Ok(back())
}
