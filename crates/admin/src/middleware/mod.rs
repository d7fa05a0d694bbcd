//! HTTP middleware for the back office.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions, in-memory store)

pub mod session;

pub use session::{SESSION_COOKIE_NAME, create_session_layer};
