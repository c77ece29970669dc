//! Remote hierarchical store boundary.
//!
//! Sweeps never talk to the database directly; they go through the
//! [`TreeStore`] capability so the same pass runs against the hosted
//! Realtime Database or the in-process store used by tests.

mod memory;
mod rtdb;

pub use memory::MemoryStore;
pub use rtdb::RtdbClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::token::TokenError;

/// JSON object holding a node's direct children.
pub type ChildMap = Map<String, Value>;

/// A location in a hierarchical key-value store, plus the two operations
/// a sweep needs: snapshot reads and partial updates.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Fetch the full content at `path`. Returns `None` when the node is
    /// absent or holds a scalar (a scalar node has no child keys).
    async fn read(&self, path: &str) -> Result<Option<ChildMap>, StoreError>;

    /// Fetch only the direct child keys at `path`; values are placeholders.
    async fn read_shallow(&self, path: &str) -> Result<Option<ChildMap>, StoreError>;

    /// Apply a partial update at `path` as one atomic write.
    /// A `null` value is a tombstone: it deletes the corresponding key.
    async fn patch(&self, path: &str, update: ChildMap) -> Result<(), StoreError>;
}

/// Errors raised at the store boundary.
#[derive(Debug)]
pub enum StoreError {
    /// The request never completed (connection, TLS, body transfer).
    Transport(reqwest::Error),
    /// The store answered with a non-success status.
    Status { path: String, status: u16 },
    /// No access token could be obtained for the request.
    Auth(TokenError),
    /// The path failed validation before any request was sent.
    InvalidPath(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transport(e) => write!(f, "Request failed: {}", e),
            StoreError::Status { path, status } => {
                write!(f, "Store answered {} for '{}'", status, path)
            }
            StoreError::Auth(e) => write!(f, "Failed to obtain access token: {}", e),
            StoreError::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Characters the store rejects inside path segments.
const FORBIDDEN_PATH_CHARS: [char; 5] = ['.', '$', '#', '[', ']'];

/// Validate a slash-delimited store path.
pub fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath("path must not be empty".into()));
    }

    if path.starts_with('/') || path.ends_with('/') {
        return Err(StoreError::InvalidPath(format!(
            "path must not start or end with '/': {}",
            path
        )));
    }

    if path.contains("//") {
        return Err(StoreError::InvalidPath(format!(
            "path must not contain empty segments: {}",
            path
        )));
    }

    if path
        .chars()
        .any(|c| c.is_whitespace() || FORBIDDEN_PATH_CHARS.contains(&c))
    {
        return Err(StoreError::InvalidPath(format!(
            "path contains invalid characters: {}",
            path
        )));
    }

    Ok(())
}
