//! In-process tree store for tests and local runs.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ChildMap, StoreError, TreeStore, validate_path};

/// Tree store holding its data in process memory.
///
/// Mirrors the remote store's semantics: paths address nested JSON,
/// a `null` in a patch removes the key, and a node whose last child is
/// removed ceases to exist.
pub struct MemoryStore {
    root: Mutex<Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    /// Create a store pre-seeded with the given tree.
    pub fn with_root(root: Value) -> Self {
        Self {
            root: Mutex::new(root),
        }
    }

    /// Current content at `path`. Intended for test assertions.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = self.root.lock().expect("store lock poisoned");
        node_at(&root, path).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn node_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/').try_fold(root, |node, segment| node.get(segment))
}

/// Descend to `path`, turning every visited node into an object.
fn object_at<'a>(root: &'a mut Value, path: &str) -> &'a mut Map<String, Value> {
    let mut node = root;
    for segment in path.split('/') {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert(Value::Object(Map::new()));
    }
    ensure_object(node)
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Remove nodes along `path` that no longer hold any children,
/// deepest first, the way the remote store collapses empty nodes.
fn drop_empty_nodes(node: &mut Value, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if let Some(child) = node.get_mut(*first) {
        drop_empty_nodes(child, rest);
        let empty = match child {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        };
        if empty {
            if let Value::Object(map) = node {
                map.remove(*first);
            }
        }
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<ChildMap>, StoreError> {
        validate_path(path)?;
        let root = self.root.lock().expect("store lock poisoned");
        Ok(node_at(&root, path).and_then(Value::as_object).cloned())
    }

    async fn read_shallow(&self, path: &str) -> Result<Option<ChildMap>, StoreError> {
        validate_path(path)?;
        let root = self.root.lock().expect("store lock poisoned");
        Ok(node_at(&root, path).and_then(Value::as_object).map(|map| {
            // Same shape the REST API returns for shallow reads:
            // keys preserved, values replaced with placeholders.
            map.keys()
                .map(|key| (key.clone(), Value::Bool(true)))
                .collect()
        }))
    }

    async fn patch(&self, path: &str, update: ChildMap) -> Result<(), StoreError> {
        validate_path(path)?;
        let mut root = self.root.lock().expect("store lock poisoned");

        let node = object_at(&mut root, path);
        for (key, value) in update {
            match value {
                Value::Null => {
                    node.remove(&key);
                }
                value => {
                    node.insert(key, value);
                }
            }
        }

        let segments: Vec<&str> = path.split('/').collect();
        drop_empty_nodes(&mut root, &segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        MemoryStore::with_root(json!({
            "dashboards": {
                "d1": {
                    "dataGridLogs": {"a": 1, "b": 2},
                    "settings": {"clearDataGridLogsDaily": true},
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_read_returns_children() {
        let store = seeded();
        let map = store.read("dashboards/d1/dataGridLogs").await.unwrap().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], json!(1));
    }

    #[tokio::test]
    async fn test_read_absent_and_scalar_nodes() {
        let store = seeded();
        assert!(store.read("dashboards/missing").await.unwrap().is_none());
        // "a" holds a scalar
        assert!(
            store
                .read("dashboards/d1/dataGridLogs/a")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_shallow_read_yields_placeholder_values() {
        let store = seeded();
        let map = store
            .read_shallow("dashboards/d1/dataGridLogs")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(map["a"], Value::Bool(true));
        assert_eq!(map["b"], Value::Bool(true));
    }

    #[tokio::test]
    async fn test_patch_tombstones_remove_keys() {
        let store = seeded();
        let update: ChildMap = [("a".to_string(), Value::Null)].into_iter().collect();
        store.patch("dashboards/d1/dataGridLogs", update).await.unwrap();

        let map = store.read("dashboards/d1/dataGridLogs").await.unwrap().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("b"));
    }

    #[tokio::test]
    async fn test_emptied_node_disappears() {
        let store = seeded();
        let update: ChildMap = [
            ("a".to_string(), Value::Null),
            ("b".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        store.patch("dashboards/d1/dataGridLogs", update).await.unwrap();

        assert!(store.get("dashboards/d1/dataGridLogs").is_none());
        // Siblings survive
        assert!(store.get("dashboards/d1/settings").is_some());
    }

    #[tokio::test]
    async fn test_patch_creates_intermediate_nodes() {
        let store = MemoryStore::new();
        let update: ChildMap = [("x".to_string(), json!("y"))].into_iter().collect();
        store.patch("a/b/c", update).await.unwrap();
        assert_eq!(store.get("a/b/c/x"), Some(json!("y")));
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let store = MemoryStore::new();
        assert!(store.read("/leading").await.is_err());
    }
}
