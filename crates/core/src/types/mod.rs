//! Core types for Shopfloor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{CurrencyCode, CurrencyError, Price};
pub use status::PhotoStatus;
