use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::jobs::processor::{JobOutcome, SharedProcessor};
use crate::jobs::source::JobSourceClient;

/// Polls the job source on a fixed cadence and hands jobs to the processor.
pub struct Scheduler {
    processor: SharedProcessor,
    source: Arc<JobSourceClient>,
    job_type: i32,
    pod_name: String,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        processor: SharedProcessor,
        source: JobSourceClient,
        job_type: i32,
        pod_name: String,
        interval: Duration,
    ) -> Self {
        Self {
            processor,
            source: Arc::new(source),
            job_type,
            pod_name,
            interval,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.check_for_new_job().await;
            }
        })
    }

    /// One scheduling tick. Returns the handle of the spawned job, if any.
    ///
    /// The job runs on its own task so the next tick is never held up.
    pub async fn check_for_new_job(&self) -> Option<JoinHandle<()>> {
        if !self.processor.is_available() {
            tracing::debug!(
                current = ?self.processor.coordinator().current_job_id(),
                "Job processor is busy"
            );
            return None;
        }

        let job = self.source.find_job(self.job_type, &self.pod_name).await?;
        tracing::info!(job_id = %job.id, "Received job");

        let processor = Arc::clone(&self.processor);
        let source = Arc::clone(&self.source);
        let pod_name = self.pod_name.clone();

        Some(tokio::spawn(async move {
            let job_id = job.id.clone();
            // Failed jobs stay unreported so the job source redelivers them.
            if let Ok(JobOutcome::Completed(_)) = processor.process(job).await {
                source.finish_job(&job_id, &pod_name).await;
            }
        }))
    }
}
