pub mod api;
pub mod cli;
pub mod pruner;
pub mod schedule;
pub mod selector;
pub mod store;
pub mod sweep;
pub mod token;

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use api::create_api_router;
use axum::Router;
use selector::Selector;
use store::TreeStore;
use sweep::{SweepOptions, Sweeper};
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Store client the sweeps run against
    pub store: Arc<dyn TreeStore>,
    /// How flagged dashboards are discovered
    pub selector: Arc<dyn Selector>,
    /// Path of the dashboards collection
    pub root: String,
    /// Keys deleted per bulk write
    pub batch_size: NonZeroUsize,
    /// Interval for scheduled sweeps; None leaves sweeps HTTP-triggered only
    pub sweep_every: Option<Duration>,
}

impl ServerConfig {
    fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.store.clone(),
            self.selector.clone(),
            SweepOptions {
                root: self.root.clone(),
                batch_size: self.batch_size,
            },
        )
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    create_api_router(config.sweeper())
}

/// Spawn the background sweep scheduler when one is configured.
/// Call this before starting the server.
pub fn init_schedule(config: &ServerConfig) -> Option<tokio::task::JoinHandle<()>> {
    config
        .sweep_every
        .map(|every| schedule::spawn_sweep_scheduler(config.sweeper(), every))
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_schedule` before this to start any configured scheduler.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    init_schedule(&config);

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
