use anyhow::{bail, Context, Result};
use lifemanager_core::SessionManager;

use super::{expire_session, require_client};

pub fn status(session: &SessionManager) {
    println!("Backend:       {}", session.api().base_url());
    println!("Session:       {}", session.phase());
    println!("Token storage: {}", session.store().kind());
}

/// Call the protected test endpoint and print its greeting.
pub async fn protected(session: &SessionManager) -> Result<()> {
    let client = require_client(session)?;
    let response = client
        .protected_greeting()
        .await
        .context("Could not reach the server")?;

    if response.unauthorized {
        return expire_session(session).await;
    }

    let response = response.error_for_status().await?;
    println!("{}", response.text().await?);
    Ok(())
}

pub async fn logout(session: &SessionManager) -> Result<()> {
    match session.logout().await {
        Ok(()) => {
            println!("Logged out.");
            Ok(())
        }
        Err(e) => bail!("Logged out of this session, but: {}", e),
    }
}
