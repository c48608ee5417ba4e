use thiserror::Error;

use crate::storage::StorageError;

/// Outcome of a failed session operation.
///
/// `Display` is the message shown to the user; details of unexpected
/// failures go to the log, not into the message.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Server error. Please try again later.")]
    Server,

    #[error("Could not connect to server. Please check your connection.")]
    Connectivity,

    #[error("Could not update the saved session on this device.")]
    Storage(#[from] StorageError),

    #[error("Something went wrong. Please try again later.")]
    Unexpected,
}

impl SessionError {
    /// Worth retrying later without changing the input.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Server | SessionError::Connectivity)
    }
}
