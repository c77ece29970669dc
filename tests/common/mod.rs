#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gridsweep::ServerConfig;
use gridsweep::pruner::DEFAULT_BATCH_SIZE;
use gridsweep::selector::FullScanSelector;
use gridsweep::store::MemoryStore;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

pub fn setup(seed: Value) -> TestContext {
    setup_with_batch(seed, DEFAULT_BATCH_SIZE)
}

pub fn setup_with_batch(seed: Value, batch_size: NonZeroUsize) -> TestContext {
    let store = Arc::new(MemoryStore::with_root(seed));

    let config = ServerConfig {
        store: store.clone(),
        selector: Arc::new(FullScanSelector::new("dashboards")),
        root: "dashboards".to_string(),
        batch_size,
        sweep_every: None,
    };

    TestContext {
        app: gridsweep::create_app(&config),
        store,
    }
}

impl TestContext {
    /// GET `path` and decode the JSON response body.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).expect("Response was not JSON");

        (status, body)
    }
}
