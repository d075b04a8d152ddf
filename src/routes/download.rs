//! Job trigger endpoint.
//!
//! POST /download { id, payload }
//!
//! Acknowledges immediately with `done`. The job runs in the background and
//! its outcome only shows up in the logs.

use axum::{extract::State, routing::post, Json, Router};

use crate::jobs::SharedProcessor;
use crate::models::Job;

pub fn routes(processor: SharedProcessor) -> Router {
    Router::new()
        .route("/download", post(download))
        .with_state(processor)
}

async fn download(State(processor): State<SharedProcessor>, Json(job): Json<Job>) -> &'static str {
    tracing::info!(job_id = %job.id, "Job request");

    if processor.is_available() {
        tokio::spawn(async move {
            // Outcome is logged by the processor.
            let _ = processor.process(job).await;
        });
    } else {
        tracing::debug!(
            current = ?processor.coordinator().current_job_id(),
            "Job processor is busy"
        );
    }

    "done"
}
