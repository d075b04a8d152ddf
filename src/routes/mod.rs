//! HTTP route handlers.
//!
//! - `index`: liveness probe (GET /)
//! - `download`: fire-and-forget job trigger (POST /download)

pub mod download;
pub mod index;

use axum::Router;

use crate::jobs::SharedProcessor;

pub fn create_router(processor: SharedProcessor) -> Router {
    Router::new()
        .merge(index::routes())
        .merge(download::routes(processor))
}
