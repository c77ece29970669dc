//! Sweep trigger endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::sweep::{SweepError, Sweeper};

/// State for the sweep endpoints.
#[derive(Clone)]
pub struct SweepState {
    pub sweeper: Sweeper,
}

pub fn router(state: SweepState) -> Router {
    Router::new()
        .route("/sweep", get(trigger_sweep))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SweepParams {
    /// List the dashboards a pass would touch without deleting anything.
    #[serde(default)]
    dry_run: bool,
}

/// Dashboards a pass would touch, nothing deleted.
#[derive(Serialize)]
struct DryRunReport {
    flagged: usize,
    dashboards: Vec<String>,
}

/// Run one sweep pass and report what was deleted.
async fn trigger_sweep(
    State(state): State<SweepState>,
    Query(params): Query<SweepParams>,
) -> Result<Response, ApiError> {
    if params.dry_run {
        let dashboards = state
            .sweeper
            .preview()
            .await
            .map_err(|e| ApiError::upstream("Failed to scan dashboards", e))?;
        return Ok(Json(DryRunReport {
            flagged: dashboards.len(),
            dashboards,
        })
        .into_response());
    }

    let report = state.sweeper.run().await.map_err(|e| match &e {
        SweepError::Select { .. } => ApiError::upstream("Failed to scan dashboards", e),
        SweepError::Prune { .. } => ApiError::internal("Failed to clear dashboard logs", e),
    })?;

    Ok(Json(report).into_response())
}

/// Liveness probe.
async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
