//! Session-stored view state.
//!
//! The session carries the operator's POS workspace id and flashed notices:
//! queued by an action and removed by the next render. The POS state itself
//! lives server-side in [`crate::pos::PosWorkspaces`].

use tower_sessions::Session;
use uuid::Uuid;

use super::notice::Notice;

/// Session keys for back-office view state.
pub mod keys {
    /// Key for the operator's POS workspace id.
    pub const POS_WORKSPACE: &str = "pos_workspace";

    /// Key for queued notices.
    pub const NOTICES: &str = "notices";
}

/// Get the POS workspace id, assigning a new one on first use.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn pos_workspace_id(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(id) = session.get::<Uuid>(keys::POS_WORKSPACE).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(keys::POS_WORKSPACE, id).await?;
    tracing::debug!(workspace_id = %id, "Assigned POS workspace");
    Ok(id)
}

/// Queue a notice for the next render.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_notice(
    session: &Session,
    notice: Notice,
) -> Result<(), tower_sessions::session::Error> {
    let mut notices = session
        .get::<Vec<Notice>>(keys::NOTICES)
        .await?
        .unwrap_or_default();
    notices.push(notice);
    session.insert(keys::NOTICES, notices).await
}

/// Take all queued notices, clearing them from the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_notices(
    session: &Session,
) -> Result<Vec<Notice>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Notice>>(keys::NOTICES)
        .await?
        .unwrap_or_default())
}
