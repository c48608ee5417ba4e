//! Persistence for the session token.
//!
//! Exactly one secret is stored, under the fixed key [`TOKEN_KEY`]. The backing
//! medium is picked once when the [`TokenStore`] is built:
//! - `SecureBackend`: OS keychain / keystore via the `keyring` crate
//! - `FileBackend`: JSON file in the user data directory (less secure fallback)
//! - `MemoryBackend`: process-local, nothing survives a restart
//!
//! Callers only ever see the `TokenStore` facade. Read failures degrade to
//! "no stored token", write and clear failures are returned to the caller.

pub mod error;
pub mod file;
pub mod memory;
pub mod secure;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{Config, StorageMode};

pub use error::StorageError;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use secure::SecureBackend;

/// Name the token is stored under, in every backend.
pub const TOKEN_KEY: &str = "auth_token";

/// Service name used for the OS keychain entry and the data directory.
pub const SERVICE_NAME: &str = "lifemanager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Secure,
    File,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Secure => write!(f, "secure store"),
            StorageKind::File => write!(f, "file"),
            StorageKind::Memory => write!(f, "memory"),
        }
    }
}

/// Key-value capability for the one session token.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    async fn get(&self) -> Result<Option<String>, StorageError>;

    async fn set(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the token. Removing a token that is not there succeeds.
    async fn clear(&self) -> Result<(), StorageError>;

    fn kind(&self) -> StorageKind;
}

/// Token storage facade used by the session manager.
/// Clone is cheap - the backend is shared.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn TokenBackend>,
}

impl TokenStore {
    pub fn new(backend: impl TokenBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_backend(backend: Arc<dyn TokenBackend>) -> Self {
        Self { backend }
    }

    /// Ephemeral store, mostly useful for tests and one-shot runs.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Build the store selected by configuration.
    ///
    /// `Auto` prefers the OS secure store and falls back to the token file
    /// when the platform store cannot be reached.
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let store = match config.token_storage {
            StorageMode::Secure => Self::new(SecureBackend::new(SERVICE_NAME)?),
            StorageMode::File => Self::new(FileBackend::default_location()?),
            StorageMode::Memory => Self::in_memory(),
            StorageMode::Auto => {
                let secure = SecureBackend::new(SERVICE_NAME).ok();
                let available = match secure {
                    Some(ref backend) => backend.is_available().await,
                    None => false,
                };
                match secure {
                    Some(backend) if available => Self::new(backend),
                    _ => {
                        warn!("Secure store unavailable, falling back to token file");
                        Self::new(FileBackend::default_location()?)
                    }
                }
            }
        };
        info!(backend = %store.kind(), "Token storage selected");
        Ok(store)
    }

    pub fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    /// Read the stored token. A failing medium reads as "no token".
    pub async fn get(&self) -> Option<String> {
        match self.backend.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(backend = %self.kind(), error = %e, "Failed to read stored token");
                None
            }
        }
    }

    pub async fn set(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(token).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend.clear().await
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("backend", &self.kind())
            .finish()
    }
}
