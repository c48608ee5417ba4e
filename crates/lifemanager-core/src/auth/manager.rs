// Session lifecycle: Restoring -> {Unauthenticated, Authenticated}, then
// login/logout move between the last two. Restoring is never re-entered.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::storage::{StorageError, TokenStore};

use super::{Credentials, SessionError, SessionPhase, SessionState};

/// A successful login.
#[must_use]
#[derive(Debug)]
pub struct LoginSuccess {
    /// Set when the token could not be persisted. The session then only
    /// lasts until the process exits.
    pub storage_error: Option<StorageError>,
}

impl LoginSuccess {
    pub fn is_persisted(&self) -> bool {
        self.storage_error.is_none()
    }
}

/// Owns the current session and keeps it consistent with the `TokenStore`.
///
/// Share it behind an `Arc`; screens read snapshots with [`state`](Self::state)
/// or follow changes through [`subscribe`](Self::subscribe).
pub struct SessionManager {
    api: ApiClient,
    store: TokenStore,
    state: watch::Sender<SessionState>,
    /// Bumped by every login/logout state update, under the watch lock.
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            store,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Client carrying the current bearer token, if logged in.
    pub fn authorized_client(&self) -> Option<ApiClient> {
        self.token().map(|token| self.api.with_token(token))
    }

    /// Read the persisted token into memory. Acts once; later calls return
    /// the current state unchanged. Always leaves `is_loading` false.
    pub async fn restore(&self) -> SessionState {
        if !self.is_loading() {
            debug!("Session already restored");
            return self.state();
        }

        let started = self.generation.load(Ordering::Acquire);
        let stored = self.store.get().await;
        let found = stored.is_some();

        self.state.send_if_modified(|state| {
            if !state.is_loading {
                return false;
            }
            // A login or logout that finished while we were reading wins
            if self.generation.load(Ordering::Acquire) == started && state.token.is_none() {
                state.token = stored;
            } else {
                debug!("Session changed during restore, keeping the newer state");
            }
            state.is_loading = false;
            true
        });

        info!(found_token = found, backend = %self.store.kind(), "Session restored");
        self.state()
    }

    /// Exchange credentials for a token, persist it, then mark the session
    /// authenticated.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, SessionError> {
        let credentials = Credentials::new(username, password);
        if !credentials.is_complete() {
            return Err(SessionError::Validation(
                "Please enter both username and password.".to_string(),
            ));
        }

        let token = self
            .api
            .authenticate(&credentials)
            .await
            .map_err(login_failure)?;

        let storage_error = match self.store.set(&token).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    backend = %self.store.kind(),
                    error = %e,
                    "Failed to persist token, session will not survive a restart"
                );
                Some(e)
            }
        };

        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            state.token = Some(token);
        });
        info!(username = %credentials.username, persisted = storage_error.is_none(), "Login successful");

        Ok(LoginSuccess { storage_error })
    }

    /// Clear the persisted token, then the in-memory one. Safe to repeat.
    ///
    /// The in-memory session is cleared even when the store fails; the
    /// failure is still returned so the caller can warn that the token may
    /// come back on the next start. With no active session a failing store
    /// is only logged.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let cleared = self.store.clear().await;

        let was_authenticated = self.state.send_if_modified(|state| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            state.token.take().is_some()
        });

        match cleared {
            Ok(()) if was_authenticated => {
                info!("Logged out");
                Ok(())
            }
            Ok(()) => {
                debug!("Logout requested with no active session");
                Ok(())
            }
            Err(e) if was_authenticated => {
                error!(backend = %self.store.kind(), error = %e, "Failed to clear stored token");
                Err(SessionError::Storage(e))
            }
            Err(e) => {
                warn!(
                    backend = %self.store.kind(),
                    error = %e,
                    "Failed to clear stored token with no active session"
                );
                Ok(())
            }
        }
    }

    /// For screens that got a 401 back from an authenticated call.
    pub async fn handle_unauthorized(&self) -> Result<(), SessionError> {
        warn!("Backend rejected the session token, logging out");
        self.logout().await
    }
}

fn login_failure(err: ApiError) -> SessionError {
    match err {
        ApiError::Unauthorized => {
            info!("Login rejected: invalid credentials");
            SessionError::InvalidCredentials
        }
        ref e if e.is_connectivity() => {
            warn!(error = %e, "Login failed: backend unreachable");
            SessionError::Connectivity
        }
        ApiError::AccessDenied(_)
        | ApiError::NotFound(_)
        | ApiError::RateLimited
        | ApiError::ServerError(_) => {
            warn!(error = %err, "Login failed: backend error");
            SessionError::Server
        }
        ApiError::UnexpectedStatus(status, _) => {
            warn!(%status, "Login failed: unexpected status");
            SessionError::Server
        }
        other => {
            error!(error = %other, "Login failed unexpectedly");
            SessionError::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::storage::{MemoryBackend, StorageKind, TokenBackend};

    /// Nothing listens here; login tests that need a backend live in tests/.
    const UNUSED_BASE: &str = "http://127.0.0.1:9";

    fn manager_with(store: TokenStore) -> SessionManager {
        let api = ApiClient::new(UNUSED_BASE, Duration::from_secs(1)).unwrap();
        SessionManager::new(api, store)
    }

    struct FailingClear {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl TokenBackend for FailingClear {
        async fn get(&self) -> Result<Option<String>, StorageError> {
            self.inner.get().await
        }

        async fn set(&self, token: &str) -> Result<(), StorageError> {
            self.inner.set(token).await
        }

        async fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Task("clear rejected".to_string()))
        }

        fn kind(&self) -> StorageKind {
            StorageKind::Memory
        }
    }

    #[tokio::test]
    async fn test_restore_adopts_stored_token() {
        let manager = manager_with(TokenStore::new(MemoryBackend::with_token("T")));
        assert_eq!(manager.phase(), SessionPhase::Restoring);

        let state = manager.restore().await;
        assert_eq!(state.token.as_deref(), Some("T"));
        assert!(!state.is_loading);
        assert_eq!(manager.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_restore_without_token() {
        let manager = manager_with(TokenStore::in_memory());
        let state = manager.restore().await;
        assert!(!state.is_loading);
        assert!(!state.is_authenticated());
        assert_eq!(manager.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restore_runs_once() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = manager_with(TokenStore::from_backend(backend.clone()));
        manager.restore().await;

        backend.set("late").await.unwrap();
        let state = manager.restore().await;
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_fields() {
        let manager = manager_with(TokenStore::in_memory());
        manager.restore().await;

        for (user, pass) in [("", "secret"), ("admin", ""), ("", ""), ("  ", "secret")] {
            let result = manager.login(user, pass).await;
            assert!(matches!(result, Err(SessionError::Validation(_))));
        }
        assert!(!manager.is_authenticated());
        assert_eq!(manager.store().get().await, None);
    }

    #[tokio::test]
    async fn test_logout_clears_store_and_memory() {
        let manager = manager_with(TokenStore::new(MemoryBackend::with_token("T")));
        manager.restore().await;
        assert!(manager.is_authenticated());

        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.store().get().await, None);

        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.store().get().await, None);
    }

    #[tokio::test]
    async fn test_logout_storage_failure_still_clears_memory() {
        let store = TokenStore::new(FailingClear {
            inner: MemoryBackend::with_token("T"),
        });
        let manager = manager_with(store);
        manager.restore().await;

        let result = manager.logout().await;
        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_without_session_ignores_storage_failure() {
        let store = TokenStore::new(FailingClear {
            inner: MemoryBackend::new(),
        });
        let manager = manager_with(store);
        manager.restore().await;

        manager.logout().await.unwrap();
        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated());
    }

    /// Snapshots the token, then stalls before handing it back.
    struct SlowRead {
        inner: Arc<MemoryBackend>,
        delay: Duration,
    }

    #[async_trait]
    impl TokenBackend for SlowRead {
        async fn get(&self) -> Result<Option<String>, StorageError> {
            let token = self.inner.get().await;
            tokio::time::sleep(self.delay).await;
            token
        }

        async fn set(&self, token: &str) -> Result<(), StorageError> {
            self.inner.set(token).await
        }

        async fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear().await
        }

        fn kind(&self) -> StorageKind {
            StorageKind::Memory
        }
    }

    #[tokio::test]
    async fn test_logout_during_restore_is_not_undone() {
        let backend = Arc::new(MemoryBackend::with_token("T"));
        let manager = Arc::new(manager_with(TokenStore::new(SlowRead {
            inner: Arc::clone(&backend),
            delay: Duration::from_millis(200),
        })));

        let restoring = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.restore().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.logout().await.unwrap();

        let state = restoring.await.unwrap();
        assert!(!state.is_loading);
        assert!(!state.is_authenticated());
        assert!(!manager.is_authenticated());
        assert_eq!(backend.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let manager = manager_with(TokenStore::new(MemoryBackend::with_token("T")));
        let mut rx = manager.subscribe();
        assert!(rx.borrow_and_update().is_loading);

        manager.restore().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase(), SessionPhase::Authenticated);

        manager.handle_unauthorized().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase(), SessionPhase::Unauthenticated);

        // Already logged out: no notification
        manager.logout().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_authorized_client_carries_token() {
        let manager = manager_with(TokenStore::new(MemoryBackend::with_token("T")));
        assert!(manager.authorized_client().is_none());
        manager.restore().await;
        let client = manager.authorized_client().unwrap();
        assert_eq!(client.token(), Some("T"));
    }

    #[test]
    fn test_login_failure_mapping() {
        assert!(matches!(
            login_failure(ApiError::Unauthorized),
            SessionError::InvalidCredentials
        ));
        assert!(matches!(
            login_failure(ApiError::ServerError("boom".to_string())),
            SessionError::Server
        ));
        assert!(matches!(
            login_failure(ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, "")),
            SessionError::Server
        ));
        assert!(matches!(
            login_failure(ApiError::from_status(reqwest::StatusCode::IM_A_TEAPOT, "short and stout")),
            SessionError::Server
        ));
        assert!(matches!(
            login_failure(ApiError::InvalidResponse("missing field `token`".to_string())),
            SessionError::Unexpected
        ));
    }
}
