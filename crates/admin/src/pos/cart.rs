//! POS cart: line items accumulated from the catalog grid.
//!
//! Every line satisfies `1 <= quantity <= product.stock`. Operations that
//! would break that either fail without changing the cart or, for
//! decrements, remove the line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfloor_core::{ClientId, CurrencyCode, Price, ProductId};

use crate::api::{OrderDraft, OrderLine, Product};

/// Cart operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    #[error("only {available} of {name} available")]
    StockExceeded { name: String, available: u32 },

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("the cart is empty")]
    Empty,
}

/// A product and how many units of it are being sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }

    /// Whether another unit can be added.
    #[must_use]
    pub const fn can_increment(&self) -> bool {
        self.quantity < self.product.stock
    }
}

/// Line items in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.line(id).map_or(0, |line| line.quantity)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total as a display price.
    #[must_use]
    pub fn total_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total(), currency)
    }

    /// Add one unit of a product, creating the line if needed.
    ///
    /// # Errors
    ///
    /// `OutOfStock` if the product has no stock, `StockExceeded` if the cart
    /// already holds every available unit.
    pub fn add(&mut self, product: &Product) -> Result<u32, CartError> {
        if product.stock == 0 {
            return Err(CartError::OutOfStock {
                name: product.name.clone(),
            });
        }

        if let Some(line) = self.line_mut(product.id) {
            // Prefer the freshest snapshot of price and stock
            line.product.clone_from(product);
            if line.quantity >= line.product.stock {
                line.quantity = line.product.stock;
                return Err(CartError::StockExceeded {
                    name: line.product.name.clone(),
                    available: line.product.stock,
                });
            }
            line.quantity += 1;
            return Ok(line.quantity);
        }

        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
        });
        Ok(1)
    }

    /// Add one unit of a product already in the cart.
    ///
    /// # Errors
    ///
    /// `NotInCart` if there is no line, `StockExceeded` at the stock limit.
    pub fn increment(&mut self, id: ProductId) -> Result<u32, CartError> {
        let line = self.line_mut(id).ok_or(CartError::NotInCart(id))?;
        if !line.can_increment() {
            return Err(CartError::StockExceeded {
                name: line.product.name.clone(),
                available: line.product.stock,
            });
        }
        line.quantity += 1;
        Ok(line.quantity)
    }

    /// Remove one unit; the line disappears when its last unit is removed.
    ///
    /// Returns the remaining quantity.
    ///
    /// # Errors
    ///
    /// `NotInCart` if there is no line for the product.
    pub fn decrement(&mut self, id: ProductId) -> Result<u32, CartError> {
        let line = self.line_mut(id).ok_or(CartError::NotInCart(id))?;
        line.quantity = line.quantity.saturating_sub(1);
        let remaining = line.quantity;
        if remaining == 0 {
            self.lines.retain(|l| l.product.id != id);
        }
        Ok(remaining)
    }

    /// Set an exact quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// `NotInCart` if there is no line, `StockExceeded` if `quantity` is
    /// above stock (the line is left unchanged).
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            self.remove(id)?;
            return Ok(0);
        }

        let line = self.line_mut(id).ok_or(CartError::NotInCart(id))?;
        if quantity > line.product.stock {
            return Err(CartError::StockExceeded {
                name: line.product.name.clone(),
                available: line.product.stock,
            });
        }
        line.quantity = quantity;
        Ok(quantity)
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// `NotInCart` if there is no line for the product.
    pub fn remove(&mut self, id: ProductId) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product.id == id)
            .ok_or(CartError::NotInCart(id))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Refresh a line's product snapshot after the catalog was refetched.
    ///
    /// The quantity is clamped to the new stock; the line is dropped when
    /// the product sold out. Returns `true` if the quantity changed.
    pub fn sync_stock(&mut self, product: &Product) -> bool {
        let Some(line) = self.line_mut(product.id) else {
            return false;
        };
        line.product.clone_from(product);

        if line.quantity <= product.stock {
            return false;
        }
        if product.stock == 0 {
            self.lines.retain(|l| l.product.id != product.id);
        } else {
            line.quantity = product.stock;
        }
        true
    }

    /// Build the order payload for checkout.
    ///
    /// # Errors
    ///
    /// `Empty` if there is nothing to sell.
    pub fn to_order_draft(&self, client_id: Option<ClientId>) -> Result<OrderDraft, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(OrderDraft {
            client_id,
            items: self
                .lines
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product.id,
                    quantity: line.quantity,
                    unit_price: line.product.price,
                })
                .collect(),
        })
    }

    /// Take the units an order sold out of the cart.
    ///
    /// Each sold line lowers the matching cart line by its quantity and
    /// drops it at zero. Lines the order did not mention are kept.
    pub fn remove_sold(&mut self, sold: &[OrderLine]) {
        for item in sold {
            if let Some(line) = self.line_mut(item.product_id) {
                line.quantity = line.quantity.saturating_sub(item.quantity);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == id)
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == id)
    }
}
