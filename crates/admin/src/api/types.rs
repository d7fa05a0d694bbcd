//! Records exchanged with the remote REST API.
//!
//! These are display records: they are fetched verbatim and held in view
//! state, never persisted locally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfloor_core::{CategoryId, ClientId, OrderId, PhotoId, PhotoStatus, ProductId};

// =============================================================================
// Catalog
// =============================================================================

/// A sellable product as listed by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Category label, if the product is categorised.
    #[serde(default)]
    pub category: Option<String>,
    /// Units available for sale.
    #[serde(default)]
    pub stock: u32,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Query parameters for the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub category: Option<CategoryId>,
}

// =============================================================================
// Clients
// =============================================================================

/// A customer that an order can be billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// Tax or national identification code.
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Query parameters for the client search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientQuery {
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// A single order line sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// An order ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub items: Vec<OrderLine>,
}

/// The remote service's acknowledgement of a created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub total: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Photos
// =============================================================================

/// A product photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub status: PhotoStatus,
    /// Display order, ascending.
    #[serde(default)]
    pub position: i32,
}

/// Result of pushing temporary photos to the commerce platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: u32,
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page number this page represents.
    pub page: u32,
    /// Last available page number.
    pub last_page: u32,
    /// Total number of records across all pages, when reported.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Returns true if pages after this one exist.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.last_page
    }
}

/// `{"data": [...], "meta": {...}}` envelope used by paginated endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct PagedEnvelope<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> From<PagedEnvelope<T>> for Page<T> {
    fn from(envelope: PagedEnvelope<T>) -> Self {
        Self {
            items: envelope.data,
            page: envelope.meta.current_page,
            // An empty listing reports last_page 0 on some backends
            last_page: envelope.meta.last_page.max(envelope.meta.current_page),
            total: envelope.meta.total,
        }
    }
}

/// `{"data": ...}` envelope used by non-paginated endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}
