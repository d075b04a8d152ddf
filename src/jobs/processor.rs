//! Job processing pipeline: coordinator permit, then reconciliation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StorageLimit;
use crate::error::{AppError, Result};
use crate::git;
use crate::jobs::coordinator::JobCoordinator;
use crate::models::{Job, LocalRepositoryHandle};
use crate::storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(LocalRepositoryHandle),
    /// Another job held the coordinator; the job was not attempted.
    Skipped { busy_with: String },
}

pub struct JobProcessor {
    coordinator: Arc<JobCoordinator>,
    repository_dir: PathBuf,
    storage_limit: Option<StorageLimit>,
}

pub type SharedProcessor = Arc<JobProcessor>;

impl JobProcessor {
    pub fn new(
        coordinator: Arc<JobCoordinator>,
        repository_dir: PathBuf,
        storage_limit: Option<StorageLimit>,
    ) -> Self {
        Self {
            coordinator,
            repository_dir,
            storage_limit,
        }
    }

    pub fn coordinator(&self) -> &Arc<JobCoordinator> {
        &self.coordinator
    }

    pub fn is_available(&self) -> bool {
        self.coordinator.is_available()
    }

    /// Runs `job` if the coordinator is free.
    ///
    /// The blocking git work runs off the async runtime and owns the permit,
    /// so the coordinator stays held until that work has really ended.
    pub async fn process(&self, job: Job) -> Result<JobOutcome> {
        let permit = match self.coordinator.acquire(&job.id) {
            Ok(permit) => permit,
            Err(AppError::Busy { current }) => {
                tracing::debug!(job_id = %job.id, busy_with = %current, "Job processor is busy, skipping job");
                return Ok(JobOutcome::Skipped { busy_with: current });
            }
            Err(e) => return Err(e),
        };

        let job_id = job.id.clone();
        tracing::info!(job_id = %job_id, "Processing job");

        let repository_dir = self.repository_dir.clone();
        let storage_limit = self.storage_limit;

        let result = tokio::task::spawn_blocking(move || -> Result<LocalRepositoryHandle> {
            let _permit = permit;
            let descriptor = job.descriptor(&repository_dir)?;
            let handle = git::reconcile(&descriptor)?;
            check_storage_usage(&repository_dir, storage_limit);
            Ok(handle)
        })
        .await
        .unwrap_or_else(|e| Err(AppError::Internal(format!("job task failed: {}", e))));

        match result {
            Ok(handle) => {
                tracing::info!(
                    job_id = %job_id,
                    path = %handle.path.display(),
                    branch = %handle.branch,
                    "Job finished"
                );
                Ok(JobOutcome::Completed(handle))
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed job");
                Err(e)
            }
        }
    }
}

fn check_storage_usage(repository_dir: &std::path::Path, limit: Option<StorageLimit>) {
    let used = storage::directory_size(repository_dir);
    match limit {
        Some(limit) if used > limit.bytes() => tracing::warn!(
            used = %storage::human_readable_bytes(used),
            limit = %storage::human_readable_bytes(limit.bytes()),
            "Repository storage exceeds the configured limit"
        ),
        _ => tracing::debug!(used = %storage::human_readable_bytes(used), "Repository storage usage"),
    }
}
