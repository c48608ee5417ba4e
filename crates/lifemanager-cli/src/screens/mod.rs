//! Terminal screens, one per command.
//!
//! Screens only talk to the `SessionManager` and the clients it hands out.
//! A 401 from any authenticated call ends the session through
//! [`expire_session`].

pub mod document_form;
pub mod home;
pub mod login;

use anyhow::{anyhow, bail, Result};
use lifemanager_core::{ApiClient, SessionManager};
use tracing::warn;

/// Client for authenticated calls, or a hint to log in first.
pub(crate) fn require_client(session: &SessionManager) -> Result<ApiClient> {
    session
        .authorized_client()
        .ok_or_else(|| anyhow!("Not logged in. Run `lifemanager login` first."))
}

/// The backend rejected our token: drop the session and tell the user.
pub(crate) async fn expire_session(session: &SessionManager) -> Result<()> {
    if let Err(e) = session.handle_unauthorized().await {
        warn!(error = %e, "Session ended but the saved token could not be removed");
    }
    bail!("Your session has expired. Please log in again with `lifemanager login`.")
}
