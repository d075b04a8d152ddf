use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Statistics of one historical commit as produced by the history walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub revision_id: String,
    pub author_name: String,
    pub author_email: String,
    pub author_timestamp: DateTime<FixedOffset>,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}
