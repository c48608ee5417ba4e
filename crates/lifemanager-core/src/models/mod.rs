//! Data models for Life Manager documents.
//!
//! - `NewDocument`, `DocumentFile`: payload for a document submission
//! - `Document`: document as returned by the backend

pub mod document;

pub use document::{Document, DocumentFile, NewDocument};
