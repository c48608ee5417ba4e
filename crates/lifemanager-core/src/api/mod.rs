//! REST API client module for the Life Manager backend.
//!
//! This module provides the `ApiClient` for the login exchange and for
//! bearer-authenticated calls to the `/api/v1` routes (protected endpoint,
//! document submission).
//!
//! A 401 from an authenticated call is reported on the `ApiResponse`
//! (`unauthorized`) and, optionally, through a hook. Logging out in
//! response is left to the caller.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, UnauthorizedHook, DOCUMENTS_PATH, LOGIN_PATH, PROTECTED_PATH};
pub use error::ApiError;
pub use request::{ApiResponse, RequestBody, RequestOptions};
