//! HTTP client for the external job source.
//!
//! Polling problems never escalate: a failed poll is logged and reads as
//! "no job", a failed completion report is logged and dropped.

use reqwest::header::ACCEPT;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Job;

pub struct JobSourceClient {
    client: Client,
    base_url: String,
}

impl JobSourceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    ///
    /// Job ids are opaque, so a `/` or `?` inside one stays in its segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::JobSource(format!("invalid job source url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::JobSource(format!("job source url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn find_job(&self, job_type: i32, pod_name: &str) -> Option<Job> {
        tracing::debug!(url = %self.base_url, job_type, "Looking for job");
        match self.request_job(job_type, pod_name).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(error = %e, "Cannot get job");
                None
            }
        }
    }

    async fn request_job(&self, job_type: i32, pod_name: &str) -> Result<Option<Job>> {
        let job_type = job_type.to_string();
        let url = self.url(&["find_job", job_type.as_str(), pod_name])?;
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::JobSource(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::JobSource(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::JobSource(format!("failed to read response of {}: {}", url, e)))?;

        if body.trim().is_empty() {
            tracing::debug!("No job found");
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| AppError::JobSource(format!("malformed job from {}: {}", url, e)))
    }

    pub async fn finish_job(&self, job_id: &str, pod_name: &str) {
        tracing::info!(job_id = %job_id, "Finishing job");
        let url = match self.url(&["finish_job", job_id, pod_name]) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to report finished job");
                return;
            }
        };
        match self.client.put(url).send().await {
            Ok(response) => tracing::info!(
                job_id = %job_id,
                status = %response.status(),
                "Reported that job is finished"
            ),
            Err(e) => tracing::warn!(job_id = %job_id, error = %e, "Failed to report finished job"),
        }
    }
}
