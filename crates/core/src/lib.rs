//! Shopfloor Core - Shared types library.
//!
//! This crate provides common types used across the Shopfloor components:
//! - `admin` - Back-office service (POS screen, photo gallery)
//! - `integration-tests` - Fake remote API and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and photo states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
