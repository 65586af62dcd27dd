//! Append-only record store behind a trait seam.
//!
//! - `FirestoreStore`: Firestore REST API (production)
//! - `MemoryStore`: in-process, for local runs and tests

pub mod credentials;
pub mod firestore;
pub mod memory;

use crate::models::record::PersistedRecord;

pub use credentials::{CredentialsError, ServiceAccount};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Durable append of a flat record to a named collection.
///
/// Returns the id the store assigned to the new document.
pub trait RecordStore: Send + Sync {
    fn append(&self, collection: &str, record: &PersistedRecord) -> Result<String, StoreError>;

    /// Short identifier for logs.
    fn describe(&self) -> String;
}

/// Errors from RecordStore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot reach document store at {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Document store returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected document store response: {0}")]
    ResponseParsing(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            let target = e
                .url()
                .map(|u| u.origin().ascii_serialization())
                .unwrap_or_else(|| "unknown host".to_string());
            StoreError::Connection(target)
        } else if e.is_decode() {
            StoreError::ResponseParsing(e.to_string())
        } else {
            StoreError::HttpClient(e.to_string())
        }
    }
}
