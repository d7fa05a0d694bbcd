//! Point-of-sale screen state.
//!
//! Everything here is plain data plus the operations the screen performs on
//! it. None of it talks to the network: handlers fetch from the remote API
//! and feed the results in. Each operator's [`PosState`] is kept in a
//! [`PosWorkspaces`] registry between requests.

pub mod cart;
pub mod catalog;
pub mod client_picker;
pub mod drag_scroll;
pub mod paging;
pub mod workspace;

pub use cart::{Cart, CartError, CartLine};
pub use catalog::{CatalogBrowser, CategoryFilter, CategoryOption};
pub use client_picker::{ClientPicker, PickerError};
pub use drag_scroll::DragScroll;
pub use paging::{FetchTicket, PagedList};
pub use workspace::{PosWorkspaces, Workspace};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::OrderDraft;
use crate::config::PosConfig;

/// Reasons a checkout cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("a checkout is already in progress")]
    InProgress,

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Per-operator POS state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosState {
    pub catalog: CatalogBrowser,
    pub cart: Cart,
    pub clients: ClientPicker,
    /// When the order currently awaiting the remote API was submitted.
    checkout_started: Option<DateTime<Utc>>,
}

impl PosState {
    #[must_use]
    pub fn new(config: &PosConfig) -> Self {
        Self {
            catalog: CatalogBrowser::new(config.page_size),
            cart: Cart::new(),
            clients: ClientPicker::new(config.client_page_size),
            checkout_started: None,
        }
    }

    /// Whether an order has been submitted and not yet answered.
    #[must_use]
    pub const fn checkout_in_flight(&self) -> bool {
        self.checkout_started.is_some()
    }

    /// Build the order for the current cart and mark it as submitted.
    ///
    /// A marker older than `stale_after` belongs to a request that can no
    /// longer complete and is replaced.
    ///
    /// # Errors
    ///
    /// `InProgress` while another checkout is awaiting its answer, `Cart` if
    /// the cart is empty.
    pub fn begin_checkout(
        &mut self,
        now: DateTime<Utc>,
        stale_after: TimeDelta,
    ) -> Result<OrderDraft, CheckoutError> {
        if let Some(started) = self.checkout_started {
            if now - started < stale_after {
                return Err(CheckoutError::InProgress);
            }
            tracing::warn!(%started, "Replacing abandoned checkout marker");
        }
        let draft = self
            .cart
            .to_order_draft(self.clients.selected().map(|c| c.id))?;
        self.checkout_started = Some(now);
        Ok(draft)
    }

    /// Release the marker after a failed checkout. The cart is untouched.
    pub fn abort_checkout(&mut self) {
        self.checkout_started = None;
    }

    /// Settle a successful checkout.
    ///
    /// Only what `draft` sold leaves the cart; lines added or raised while
    /// the order was in flight stay. The client selection is cleared if it
    /// is still the one the order was placed for. The grid restarts so the
    /// next render shows post-sale stock.
    pub fn finish_sale(&mut self, draft: &OrderDraft) {
        self.checkout_started = None;
        self.cart.remove_sold(&draft.items);
        if self.clients.selected().map(|c| c.id) == draft.client_id {
            self.clients.clear_selection();
        }
        let filter = self.catalog.filter();
        self.catalog.select_category(filter);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfloor_core::{ClientId, ProductId};

    use super::*;
    use crate::api::{Client, Page, Product};

    fn product(id: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(500, 2),
            category: None,
            stock,
        }
    }

    fn with_client(pos: &mut PosState, id: i64) {
        pos.clients.search("");
        let (ticket, _) = pos.clients.load_more().unwrap();
        let client = Client {
            id: ClientId::new(id),
            name: format!("Client {id}"),
            tax_id: None,
            phone: None,
            email: None,
        };
        pos.clients.apply_page(
            ticket,
            Page {
                items: vec![client],
                page: 1,
                last_page: 1,
                total: Some(1),
            },
        );
        pos.clients.select(ClientId::new(id)).unwrap();
    }

    fn stale() -> TimeDelta {
        TimeDelta::seconds(30)
    }

    #[test]
    fn test_second_checkout_is_refused_while_first_is_pending() {
        let mut pos = PosState::new(&PosConfig::default());
        pos.cart.add(&product(1, 3)).unwrap();
        let now = Utc::now();

        let draft = pos.begin_checkout(now, stale()).unwrap();
        assert_eq!(draft.items.len(), 1);
        assert!(pos.checkout_in_flight());
        assert_eq!(
            pos.begin_checkout(now + TimeDelta::seconds(1), stale()),
            Err(CheckoutError::InProgress)
        );

        pos.abort_checkout();
        assert!(!pos.checkout_in_flight());
        assert_eq!(pos.cart.quantity_of(ProductId::new(1)), 1);
        assert!(pos.begin_checkout(now, stale()).is_ok());
    }

    #[test]
    fn test_abandoned_checkout_marker_expires() {
        let mut pos = PosState::new(&PosConfig::default());
        pos.cart.add(&product(1, 3)).unwrap();
        let now = Utc::now();
        pos.begin_checkout(now, stale()).unwrap();

        assert!(pos.begin_checkout(now + stale(), stale()).is_ok());
    }

    #[test]
    fn test_empty_cart_checkout_leaves_no_marker() {
        let mut pos = PosState::new(&PosConfig::default());

        assert_eq!(
            pos.begin_checkout(Utc::now(), stale()),
            Err(CheckoutError::Cart(CartError::Empty))
        );
        assert!(!pos.checkout_in_flight());
    }

    #[test]
    fn test_finish_sale_keeps_changes_made_during_checkout() {
        let mut pos = PosState::new(&PosConfig::default());
        with_client(&mut pos, 4);
        pos.cart.add(&product(1, 3)).unwrap();
        let draft = pos.begin_checkout(Utc::now(), stale()).unwrap();

        pos.cart.add(&product(2, 3)).unwrap();
        pos.finish_sale(&draft);

        assert!(!pos.checkout_in_flight());
        assert_eq!(pos.cart.quantity_of(ProductId::new(1)), 0);
        assert_eq!(pos.cart.quantity_of(ProductId::new(2)), 1);
        assert!(pos.clients.selected().is_none());
    }

    #[test]
    fn test_finish_sale_keeps_client_picked_during_checkout() {
        let mut pos = PosState::new(&PosConfig::default());
        pos.cart.add(&product(1, 3)).unwrap();
        let draft = pos.begin_checkout(Utc::now(), stale()).unwrap();

        with_client(&mut pos, 7);
        pos.finish_sale(&draft);

        assert_eq!(pos.clients.selected().map(|c| c.id), Some(ClientId::new(7)));
    }
}
