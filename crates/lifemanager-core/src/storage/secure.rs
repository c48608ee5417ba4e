use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use tokio::task;
use tracing::debug;

use super::{StorageError, StorageKind, TokenBackend, TOKEN_KEY};

/// Token kept in the OS keychain (Keychain, Credential Manager, kernel keyutils).
///
/// The keyring API is blocking, so every call runs on the blocking pool.
#[derive(Clone)]
pub struct SecureBackend {
    entry: Arc<Entry>,
}

impl SecureBackend {
    pub fn new(service: &str) -> Result<Self, StorageError> {
        let entry = Entry::new(service, TOKEN_KEY)?;
        Ok(Self {
            entry: Arc::new(entry),
        })
    }

    /// Whether the platform store answers at all. A missing entry still counts
    /// as available; only access or platform failures do not.
    pub async fn is_available(&self) -> bool {
        match self.get().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Secure store probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl TokenBackend for SecureBackend {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        let entry = Arc::clone(&self.entry);
        let result = task::spawn_blocking(move || entry.get_password()).await?;
        match result {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, token: &str) -> Result<(), StorageError> {
        let entry = Arc::clone(&self.entry);
        let token = token.to_string();
        task::spawn_blocking(move || entry.set_password(&token)).await??;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let entry = Arc::clone(&self.entry);
        let result = task::spawn_blocking(move || entry.delete_credential()).await?;
        match result {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Secure
    }
}
