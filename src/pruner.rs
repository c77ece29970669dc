//! Batched deletion of a subtree's direct children.

use std::num::NonZeroUsize;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::store::{StoreError, TreeStore};

/// Keys deleted per bulk write. Bounds the payload of any single update
/// request within the store's write limits.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(5000).unwrap();

/// Result of a completed pruning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The subtree was absent or had no children; no write was issued.
    Empty,
    /// Every child was deleted; holds the number of removed keys.
    Deleted(usize),
}

impl PruneOutcome {
    /// Number of keys the pass deleted.
    pub fn deleted(&self) -> usize {
        match self {
            PruneOutcome::Empty => 0,
            PruneOutcome::Deleted(count) => *count,
        }
    }
}

/// Errors that can end a pruning pass.
#[derive(Debug)]
pub enum PruneError {
    /// The key snapshot could not be read; nothing was deleted.
    Read { path: String, source: StoreError },
    /// A batch write failed. Batches acknowledged before it stay
    /// committed; later batches were never attempted.
    Write {
        path: String,
        batches_done: usize,
        keys_deleted: usize,
        source: StoreError,
    },
}

impl std::fmt::Display for PruneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneError::Read { path, source } => {
                write!(f, "Failed to read '{}': {}", path, source)
            }
            PruneError::Write {
                path,
                batches_done,
                keys_deleted,
                source,
            } => write!(
                f,
                "Failed to delete batch {} under '{}' ({} keys already deleted): {}",
                batches_done + 1,
                path,
                keys_deleted,
                source
            ),
        }
    }
}

impl std::error::Error for PruneError {}

/// Delete every direct child of `path`, at most `batch_size` keys per
/// write.
///
/// The key set is read once; batches are derived client-side from that
/// snapshot and submitted strictly in sequence, each one a single
/// tombstone update the store applies atomically. Re-running on a
/// partially pruned subtree deletes whatever remains.
pub async fn prune(
    store: &dyn TreeStore,
    path: &str,
    batch_size: NonZeroUsize,
) -> Result<PruneOutcome, PruneError> {
    let snapshot = store
        .read_shallow(path)
        .await
        .map_err(|source| PruneError::Read {
            path: path.to_string(),
            source,
        })?;

    let keys: Vec<String> = match snapshot {
        Some(map) if !map.is_empty() => map.into_iter().map(|(key, _)| key).collect(),
        _ => {
            debug!(path = %path, "Nothing to prune");
            return Ok(PruneOutcome::Empty);
        }
    };

    let total = keys.len();
    let batches = total.div_ceil(batch_size.get());
    info!(path = %path, keys = total, batches, "Pruning subtree");

    for (index, batch) in keys.chunks(batch_size.get()).enumerate() {
        let update: Map<String, Value> = batch
            .iter()
            .map(|key| (key.clone(), Value::Null))
            .collect();

        store
            .patch(path, update)
            .await
            .map_err(|source| PruneError::Write {
                path: path.to_string(),
                batches_done: index,
                keys_deleted: index * batch_size.get(),
                source,
            })?;

        info!(
            path = %path,
            batch = index + 1,
            batches,
            size = batch.len(),
            "Deleted batch"
        );
    }

    info!(path = %path, deleted = total, "Subtree pruned");
    Ok(PruneOutcome::Deleted(total))
}
