//! Job DTOs exchanged with the job source and the `/download` trigger.
//!
//! The payload is typed per job kind. Only the clone job exists today.
//! Every string is trimmed on read; blank or non-string values count as absent.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{ComponentType, Credentials, RepositoryDescriptor};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub payload: ClonePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonePayload {
    #[serde(default, deserialize_with = "trimmed")]
    pub component_path: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub component: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub component_type: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub git_url: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub git_branch: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub git_token: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub git_name: Option<String>,
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

impl Job {
    /// Builds the reconciliation descriptor for this job.
    ///
    /// Relative component paths are resolved against `repository_dir`.
    pub fn descriptor(&self, repository_dir: &Path) -> Result<RepositoryDescriptor> {
        let payload = &self.payload;
        let url = require(&payload.git_url, "gitUrl", &self.id)?;
        let branch = require(&payload.git_branch, "gitBranch", &self.id)?;
        let component_path = require(&payload.component_path, "componentPath", &self.id)?;

        let kind = payload
            .component_type
            .as_deref()
            .map(ComponentType::from_str)
            .transpose()?;

        let credentials = match (&payload.git_name, &payload.git_token) {
            (Some(username), Some(token)) => Some(Credentials {
                username: username.clone(),
                token: token.clone(),
            }),
            _ => None,
        };

        let path = PathBuf::from(component_path);
        let local_path = if path.is_absolute() {
            path
        } else {
            repository_dir.join(path)
        };

        Ok(RepositoryDescriptor {
            id: payload.component.clone().unwrap_or_else(|| self.id.clone()),
            url: url.to_string(),
            branch: branch.to_string(),
            local_path,
            kind,
            credentials,
        })
    }
}

fn require<'a>(value: &'a Option<String>, key: &str, job_id: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| AppError::InvalidJob(format!("job {} has no {} in payload", job_id, key)))
}
