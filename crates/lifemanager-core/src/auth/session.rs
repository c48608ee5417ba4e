use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Startup, stored token not read yet
    Restoring,
    Unauthenticated,
    Authenticated,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Restoring => write!(f, "restoring"),
            SessionPhase::Unauthenticated => write!(f, "not logged in"),
            SessionPhase::Authenticated => write!(f, "logged in"),
        }
    }
}

/// In-memory session. The persisted copy of the token lives in the `TokenStore`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    /// True only until the startup restore has finished
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            token: None,
            is_loading: true,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Restoring
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("is_loading", &self.is_loading)
            .finish()
    }
}
