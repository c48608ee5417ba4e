//! Authentication module for the session lifecycle.
//!
//! This module provides:
//! - `SessionManager`: restore at startup, login, logout, state notifications
//! - `SessionState` / `SessionPhase`: the in-memory session
//! - `Credentials`: one login attempt's username and password
//! - `SessionError`: user-facing failure taxonomy
//!
//! The token is written to the `TokenStore` before memory on login and
//! cleared from it before memory on logout.

pub mod credentials;
pub mod error;
pub mod manager;
pub mod session;

pub use credentials::Credentials;
pub use error::SessionError;
pub use manager::{LoginSuccess, SessionManager};
pub use session::{SessionPhase, SessionState};
