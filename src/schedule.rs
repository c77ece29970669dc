//! Background scheduling for recurring sweeps.

use std::time::Duration;

use tracing::{error, info};

use crate::sweep::Sweeper;

/// Spawn a background task that sweeps periodically, starting with one
/// pass right away. Returns a handle that can be used to abort the task.
pub fn spawn_sweep_scheduler(sweeper: Sweeper, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            match sweeper.run().await {
                Ok(report) if report.deleted > 0 => {
                    info!(
                        run_id = %report.run_id,
                        dashboards = report.outcomes.len(),
                        deleted = report.deleted,
                        "Scheduled sweep complete"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Scheduled sweep failed"),
            }
        }
    })
}
