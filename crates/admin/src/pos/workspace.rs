//! Server-side registry of per-operator POS state.
//!
//! Each operator session owns one workspace. Handlers lock it only while
//! reading or changing state, never across a remote call, so concurrent
//! requests from the same operator interleave through [`FetchTicket`]s.
//!
//! [`FetchTicket`]: super::FetchTicket

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::PosState;
use crate::config::PosConfig;

/// Shared handle to one operator's POS state.
pub type Workspace = Arc<Mutex<PosState>>;

/// Idle workspaces are dropped after this long, matching the session expiry.
pub const WORKSPACE_IDLE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Clone)]
pub struct PosWorkspaces {
    config: PosConfig,
    cache: Cache<Uuid, Workspace>,
}

impl std::fmt::Debug for PosWorkspaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosWorkspaces")
            .field("config", &self.config)
            .field("count", &self.cache.entry_count())
            .finish()
    }
}

impl PosWorkspaces {
    #[must_use]
    pub fn new(config: PosConfig) -> Self {
        Self::with_idle(config, WORKSPACE_IDLE)
    }

    #[must_use]
    pub fn with_idle(config: PosConfig, idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle)
            .build();
        Self { config, cache }
    }

    /// Get a workspace, creating a fresh one if none exists.
    pub async fn get(&self, id: Uuid) -> Workspace {
        let config = self.config;
        self.cache
            .get_with(id, async move { Arc::new(Mutex::new(PosState::new(&config))) })
            .await
    }
}
