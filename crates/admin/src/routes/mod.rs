//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness
//! GET  /health/ready                         - Remote API reachable
//!
//! # POS
//! GET  /pos                                  - POS screen
//! POST /pos/category                         - Select category
//! POST /pos/search                           - Set search text
//! POST /pos/more                             - Load next product page
//! POST /pos/cart/add                         - Add product to cart
//! POST /pos/cart/update                      - Set line quantity
//! POST /pos/cart/remove                      - Remove line
//! POST /pos/cart/clear                       - Empty the cart
//! POST /pos/checkout                         - Submit order
//!
//! # Client picker
//! GET  /pos/clients                          - Search clients (HTMX fragment)
//! POST /pos/clients/more                     - Next client page
//! POST /pos/clients/select                   - Select client
//! POST /pos/clients/clear                    - Clear selection
//!
//! # Photos
//! GET  /products/{id}/photos                 - Photo gallery
//! POST /products/{id}/photos                 - Upload
//! POST /products/{id}/photos/order           - Reorder
//! POST /products/{id}/photos/sync            - Push temporary photos
//! POST /products/{id}/photos/{photo}/delete  - Delete
//! POST /products/{id}/photos/{photo}/primary - Set primary
//! POST /products/{id}/photos/{photo}/move    - Move up/down
//! ```
//!
//! Actions follow post/redirect/get: they flash notices into the session
//! and redirect back to the screen they came from.

pub mod clients;
pub mod health;
pub mod photos;
pub mod pos;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderMap,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{Notice, session};
use crate::pos::Workspace;
use crate::state::AppState;

/// Multipart framing allowance on top of the photo size limit.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the router for all back-office screens.
pub fn routes(state: &AppState) -> Router<AppState> {
    let upload_limit = state
        .config()
        .photos
        .max_upload_bytes
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(|| async { Redirect::to(pos::POS_PATH) }))
        // POS
        .route("/pos", get(pos::index))
        .route("/pos/category", post(pos::select_category))
        .route("/pos/search", post(pos::search))
        .route("/pos/more", post(pos::more))
        .route("/pos/cart/add", post(pos::cart_add))
        .route("/pos/cart/update", post(pos::cart_update))
        .route("/pos/cart/remove", post(pos::cart_remove))
        .route("/pos/cart/clear", post(pos::cart_clear))
        .route("/pos/checkout", post(pos::checkout))
        // Client picker
        .route("/pos/clients", get(clients::search))
        .route("/pos/clients/more", post(clients::more))
        .route("/pos/clients/select", post(clients::select))
        .route("/pos/clients/clear", post(clients::clear))
        // Photos
        .route(
            "/products/{id}/photos",
            get(photos::index)
                .post(photos::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/products/{id}/photos/order", post(photos::reorder))
        .route("/products/{id}/photos/sync", post(photos::sync))
        .route(
            "/products/{id}/photos/{photo}/delete",
            post(photos::delete),
        )
        .route(
            "/products/{id}/photos/{photo}/primary",
            post(photos::set_primary),
        )
        .route("/products/{id}/photos/{photo}/move", post(photos::move_photo))
}

/// The operator's POS workspace for this session.
async fn workspace(state: &AppState, session: &Session) -> Result<Workspace, AppError> {
    let id = session::pos_workspace_id(session).await?;
    Ok(state.workspaces().get(id).await)
}

/// Queue notices for the next render.
async fn flash(
    session: &Session,
    notices: impl IntoIterator<Item = Notice>,
) -> Result<(), AppError> {
    for notice in notices {
        session::push_notice(session, notice).await?;
    }
    Ok(())
}

/// Whether the request was made by HTMX (as opposed to a boosted navigation).
fn is_htmx_fragment(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
        && headers.get("HX-Boosted").is_none()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx_fragment() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx_fragment(&headers));

        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx_fragment(&headers));

        headers.insert("HX-Boosted", HeaderValue::from_static("true"));
        assert!(!is_htmx_fragment(&headers));
    }
}
