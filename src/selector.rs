//! Selection of dashboards flagged for log clearing.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::store::{StoreError, TreeStore};

/// Settings child holding the per-dashboard opt-in flag.
pub const SETTINGS_CHILD: &str = "settings";

/// Boolean flag a dashboard sets to have its data grid logs cleared.
pub const CLEAR_LOGS_FLAG: &str = "clearDataGridLogsDaily";

/// Capability that finds the dashboard ids due for log clearing.
///
/// Implementations differ only in how they reach the flag; the flag test
/// itself is strict: the value must be boolean `true`.
#[async_trait]
pub trait Selector: Send + Sync {
    async fn select(&self, store: &dyn TreeStore) -> Result<Vec<String>, StoreError>;
}

fn flag_set(settings: Option<&Value>) -> bool {
    settings.and_then(|s| s.get(CLEAR_LOGS_FLAG)) == Some(&Value::Bool(true))
}

/// Selects with one deep read of the dashboards collection.
///
/// Cheapest when dashboards are small; the whole collection travels in a
/// single response.
pub struct FullScanSelector {
    root: String,
}

impl FullScanSelector {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Selector for FullScanSelector {
    async fn select(&self, store: &dyn TreeStore) -> Result<Vec<String>, StoreError> {
        let Some(records) = store.read(&self.root).await? else {
            debug!(root = %self.root, "No dashboards found");
            return Ok(Vec::new());
        };

        Ok(records
            .into_iter()
            .filter(|(_, record)| flag_set(record.get(SETTINGS_CHILD)))
            .map(|(id, _)| id)
            .collect())
    }
}

/// Selects with a shallow id listing followed by one settings probe per
/// dashboard.
///
/// Keeps response sizes bounded when dashboards carry large payloads,
/// at the cost of one read per record.
pub struct SettingsProbeSelector {
    root: String,
}

impl SettingsProbeSelector {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Selector for SettingsProbeSelector {
    async fn select(&self, store: &dyn TreeStore) -> Result<Vec<String>, StoreError> {
        let Some(index) = store.read_shallow(&self.root).await? else {
            debug!(root = %self.root, "No dashboards found");
            return Ok(Vec::new());
        };

        let mut flagged = Vec::new();
        for id in index.keys() {
            let path = format!("{}/{}/{}", self.root, id, SETTINGS_CHILD);
            let settings = store.read(&path).await?;
            if flag_set(settings.map(Value::Object).as_ref()) {
                flagged.push(id.clone());
            }
        }
        Ok(flagged)
    }
}
