//! Core library for the Life Manager client.
//!
//! Provides the pieces a front end needs to talk to the Life Manager backend:
//! - `storage`: persistence of the single session token (OS keychain or file fallback)
//! - `api`: HTTP client that attaches bearer credentials and reports 401s
//! - `auth`: the session lifecycle (restore, login, logout)
//! - `config`: backend address and storage selection
//! - `models`: request payloads for the document endpoints

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiResponse, RequestBody, RequestOptions, UnauthorizedHook};
pub use auth::{Credentials, LoginSuccess, SessionError, SessionManager, SessionPhase, SessionState};
pub use config::{Config, StorageMode};
pub use models::{Document, DocumentFile, NewDocument};
pub use storage::{StorageError, StorageKind, TokenBackend, TokenStore};
