mod error;
mod sweep;

use axum::Router;

use crate::sweep::Sweeper;

pub use sweep::SweepState;

/// Create the API router.
pub fn create_api_router(sweeper: Sweeper) -> Router {
    sweep::router(SweepState { sweeper })
}
