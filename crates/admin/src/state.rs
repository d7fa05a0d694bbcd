//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::AdminConfig;
use crate::pos::PosWorkspaces;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Per-operator POS state lives in the
/// workspace registry, keyed by an id stored in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: ApiClient,
    workspaces: PosWorkspaces,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote API client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let workspaces = PosWorkspaces::new(config.pos);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                workspaces,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the remote API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get the per-operator POS workspaces.
    #[must_use]
    pub fn workspaces(&self) -> &PosWorkspaces {
        &self.inner.workspaces
    }
}
