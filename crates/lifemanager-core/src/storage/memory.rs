use std::sync::Mutex;

use async_trait::async_trait;

use super::{StorageError, StorageKind, TokenBackend};

/// Token kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    token: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already "persisted", as if left by a previous run.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a usable Option
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TokenBackend for MemoryBackend {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    async fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }
}
