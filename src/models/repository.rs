//! Repository DTOs.
//!
//! - `RepositoryDescriptor`: one unit of reconciliation work
//! - `LocalRepositoryHandle`: a reconciled working copy
//! - `ComponentType`: git hosting kind

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const REMOTE_NAME: &str = "origin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Github,
    Gitlab,
}

impl FromStr for ComponentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(ComponentType::Github),
            "gitlab" => Ok(ComponentType::Gitlab),
            other => Err(AppError::UnsupportedComponentType(other.to_string())),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Github => f.write_str("github"),
            ComponentType::Gitlab => f.write_str("gitlab"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

// Keeps tokens out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    pub id: String,
    pub url: String,
    /// Remote branch name without the `origin/` prefix.
    pub branch: String,
    pub local_path: PathBuf,
    pub kind: Option<ComponentType>,
    pub credentials: Option<Credentials>,
}

impl RepositoryDescriptor {
    /// Name of the local branch that tracks the requested remote branch.
    pub fn tracking_branch(&self) -> String {
        format!("{}/{}", REMOTE_NAME, self.branch)
    }

    /// Full name of the remote-tracking reference fetched from the remote.
    pub fn remote_ref(&self) -> String {
        format!("refs/remotes/{}/{}", REMOTE_NAME, self.branch)
    }
}

impl fmt::Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalRepositoryHandle {
    pub path: PathBuf,
    /// Checked-out local branch, always `origin/<branch>`.
    pub branch: String,
    pub head: String,
}
