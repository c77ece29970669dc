mod common;

use axum::http::StatusCode;
use common::{setup, setup_with_batch};
use serde_json::json;
use std::num::NonZeroUsize;

fn seed() -> serde_json::Value {
    json!({
        "dashboards": {
            "d1": {
                "settings": {"clearDataGridLogsDaily": true},
                "dataGridLogs": {
                    "log1": {"at": 1, "msg": "loaded"},
                    "log2": {"at": 2, "msg": "sorted"},
                    "log3": {"at": 3, "msg": "filtered"},
                },
            },
            "d2": {
                "settings": {"clearDataGridLogsDaily": false},
                "dataGridLogs": {"log1": {"at": 4}},
            },
            "d3": {
                "settings": {"clearDataGridLogsDaily": true},
            },
        }
    })
}

#[tokio::test]
async fn test_sweep_clears_flagged_dashboards() {
    let ctx = setup(seed());

    let (status, body) = ctx.get("/sweep").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flagged"], 2);
    assert_eq!(body["deleted"], 3);
    assert!(body["run_id"].as_str().is_some_and(|id| !id.is_empty()));

    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["id"], "d1");
    assert_eq!(outcomes[0]["deleted"], 3);
    assert_eq!(outcomes[1]["id"], "d3");
    assert_eq!(outcomes[1]["deleted"], 0);

    // The flagged dashboard's logs are gone, the rest of it survives
    assert!(ctx.store.get("dashboards/d1/dataGridLogs").is_none());
    assert!(ctx.store.get("dashboards/d1/settings").is_some());
    // The unflagged dashboard keeps its logs
    assert!(ctx.store.get("dashboards/d2/dataGridLogs").is_some());
}

#[tokio::test]
async fn test_sweep_with_no_dashboards() {
    let ctx = setup(json!(null));

    let (status, body) = ctx.get("/sweep").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flagged"], 0);
    assert_eq!(body["deleted"], 0);
    assert_eq!(body["outcomes"], json!([]));
}

#[tokio::test]
async fn test_second_sweep_deletes_nothing() {
    let ctx = setup(seed());

    let (_, first) = ctx.get("/sweep").await;
    assert_eq!(first["deleted"], 3);

    let (status, second) = ctx.get("/sweep").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["flagged"], 2);
    assert_eq!(second["deleted"], 0);
}

#[tokio::test]
async fn test_small_batches_cover_all_keys() {
    let ctx = setup_with_batch(seed(), NonZeroUsize::new(2).unwrap());

    let (status, body) = ctx.get("/sweep").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 3);
    assert!(ctx.store.get("dashboards/d1/dataGridLogs").is_none());
}

#[tokio::test]
async fn test_dry_run_reports_without_deleting() {
    let ctx = setup(seed());

    let (status, body) = ctx.get("/sweep?dry_run=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flagged"], 2);
    assert_eq!(body["dashboards"], json!(["d1", "d3"]));

    // Nothing was touched
    assert!(ctx.store.get("dashboards/d1/dataGridLogs").is_some());

    let (_, sweep) = ctx.get("/sweep").await;
    assert_eq!(sweep["deleted"], 3);
}

#[tokio::test]
async fn test_healthz() {
    let ctx = setup(json!(null));

    let (status, body) = ctx.get("/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
