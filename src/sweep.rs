//! One maintenance pass: find flagged dashboards, prune their logs.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::pruner::{self, DEFAULT_BATCH_SIZE, PruneError};
use crate::selector::Selector;
use crate::store::{StoreError, TreeStore};

/// Child subtree of each dashboard that holds the data grid logs.
pub const LOGS_CHILD: &str = "dataGridLogs";

/// Tunables of a sweep pass.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Dashboards collection path
    pub root: String,
    /// Keys deleted per bulk write
    pub batch_size: NonZeroUsize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            root: "dashboards".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What one pass did to one dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOutcome {
    pub id: String,
    pub deleted: usize,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Correlates the report with this pass's log lines
    pub run_id: String,
    /// Dashboards that had the clear flag set
    pub flagged: usize,
    /// Per-dashboard deletion counts, in processing order
    pub outcomes: Vec<DashboardOutcome>,
    /// Total keys deleted across all dashboards
    pub deleted: usize,
}

/// Errors that can end a sweep pass.
#[derive(Debug)]
pub enum SweepError {
    /// The dashboard selection failed; nothing was deleted.
    Select { source: StoreError },
    /// Pruning one dashboard failed. Earlier dashboards stay pruned.
    Prune {
        id: String,
        completed: Vec<DashboardOutcome>,
        deleted: usize,
        source: PruneError,
    },
}

impl std::fmt::Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Select { source } => {
                write!(f, "Failed to select dashboards: {}", source)
            }
            SweepError::Prune {
                id,
                completed,
                deleted,
                source,
            } => write!(
                f,
                "Failed to clear logs of dashboard '{}' ({} dashboards done, {} keys deleted): {}",
                id,
                completed.len(),
                deleted,
                source
            ),
        }
    }
}

impl std::error::Error for SweepError {}

/// Run one pass: select the flagged dashboards, then prune each one's
/// logs subtree sequentially. The first failure aborts the pass; prunes
/// already acknowledged stay committed, and re-running is safe.
pub async fn run_sweep(
    store: &dyn TreeStore,
    selector: &dyn Selector,
    options: &SweepOptions,
) -> Result<SweepReport, SweepError> {
    let run_id = Uuid::new_v4().to_string();

    let ids = selector
        .select(store)
        .await
        .map_err(|source| SweepError::Select { source })?;

    if ids.is_empty() {
        info!(run_id = %run_id, root = %options.root, "No dashboards flagged for log clearing");
        return Ok(SweepReport {
            run_id,
            flagged: 0,
            outcomes: Vec::new(),
            deleted: 0,
        });
    }

    info!(run_id = %run_id, flagged = ids.len(), "Clearing logs of flagged dashboards");

    let mut outcomes = Vec::with_capacity(ids.len());
    let mut deleted = 0usize;

    for id in &ids {
        let path = format!("{}/{}/{}", options.root, id, LOGS_CHILD);
        match pruner::prune(store, &path, options.batch_size).await {
            Ok(outcome) => {
                deleted += outcome.deleted();
                outcomes.push(DashboardOutcome {
                    id: id.clone(),
                    deleted: outcome.deleted(),
                });
            }
            Err(source) => {
                error!(run_id = %run_id, dashboard = %id, error = %source, "Sweep aborted");
                return Err(SweepError::Prune {
                    id: id.clone(),
                    completed: outcomes,
                    deleted,
                    source,
                });
            }
        }
    }

    info!(run_id = %run_id, dashboards = outcomes.len(), deleted, "Sweep complete");
    Ok(SweepReport {
        run_id,
        flagged: ids.len(),
        outcomes,
        deleted,
    })
}

/// Everything one pass needs, bundled for the HTTP trigger and the
/// scheduler: the store capability, the selection strategy, and the
/// pruning options.
#[derive(Clone)]
pub struct Sweeper {
    store: Arc<dyn TreeStore>,
    selector: Arc<dyn Selector>,
    options: SweepOptions,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn TreeStore>,
        selector: Arc<dyn Selector>,
        options: SweepOptions,
    ) -> Self {
        Self {
            store,
            selector,
            options,
        }
    }

    /// Run one sweep pass.
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        run_sweep(self.store.as_ref(), self.selector.as_ref(), &self.options).await
    }

    /// List the dashboards a pass would touch, without deleting anything.
    pub async fn preview(&self) -> Result<Vec<String>, SweepError> {
        self.selector
            .select(self.store.as_ref())
            .await
            .map_err(|source| SweepError::Select { source })
    }
}
