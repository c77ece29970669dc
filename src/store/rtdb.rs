//! Realtime Database REST client.
//!
//! Nodes are addressed as `{base}/{path}.json`; `?shallow=true` returns
//! only the direct child keys, and a PATCH with `null` values deletes the
//! corresponding keys in one atomic partial update.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{ChildMap, StoreError, TreeStore, validate_path};
use crate::token::AccessTokenProvider;

/// Authenticated client for a hosted Realtime Database instance.
pub struct RtdbClient {
    base: String,
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl RtdbClient {
    /// Create a client for the database at `base`
    /// (e.g. `https://my-project.firebaseio.com`).
    pub fn new(base: Url, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        info!(url = %base, "Realtime Database client ready");
        Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            tokens,
        }
    }

    fn node_url(&self, path: &str, shallow: bool) -> Result<String, StoreError> {
        validate_path(path)?;
        let mut url = format!("{}/{}.json", self.base, path);
        if shallow {
            url.push_str("?shallow=true");
        }
        Ok(url)
    }

    async fn fetch(&self, path: &str, shallow: bool) -> Result<Option<ChildMap>, StoreError> {
        let url = self.node_url(path, shallow)?;
        let token = self.tokens.access_token().await.map_err(StoreError::Auth)?;

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(StoreError::Transport)?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content: Value = response.json().await.map_err(StoreError::Transport)?;
        Ok(into_child_map(path, content))
    }
}

/// The REST API answers `null` for absent nodes and a bare scalar for
/// leaf nodes; neither carries child keys.
fn into_child_map(path: &str, content: Value) -> Option<ChildMap> {
    match content {
        Value::Null => None,
        Value::Object(map) => Some(map),
        _ => {
            debug!(path = %path, "Node holds a scalar, no children");
            None
        }
    }
}

#[async_trait]
impl TreeStore for RtdbClient {
    async fn read(&self, path: &str) -> Result<Option<ChildMap>, StoreError> {
        self.fetch(path, false).await
    }

    async fn read_shallow(&self, path: &str) -> Result<Option<ChildMap>, StoreError> {
        self.fetch(path, true).await
    }

    async fn patch(&self, path: &str, update: ChildMap) -> Result<(), StoreError> {
        let url = self.node_url(path, false)?;
        let token = self.tokens.access_token().await.map_err(StoreError::Auth)?;

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&token)
            .json(&Value::Object(update))
            .send()
            .await
            .map_err(StoreError::Transport)?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_null_nodes_have_no_children() {
        assert!(into_child_map("a", Value::Null).is_none());
        assert!(into_child_map("a", Value::from(42)).is_none());
        assert!(into_child_map("a", Value::from("text")).is_none());

        let map = into_child_map("a", serde_json::json!({"k": 1})).unwrap();
        assert_eq!(map.len(), 1);
    }
}
