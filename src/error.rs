//! Application error types.
//!
//! Only `Reconciliation` and `Config` end a job or the process. `Busy`,
//! `Checkout`, `Diff` and `JobSource` are logged and the worker carries on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker is busy with job {current}")]
    Busy { current: String },

    #[error("Failed to reconcile repository at {}: {source}", path.display())]
    Reconciliation {
        path: PathBuf,
        #[source]
        source: Box<AppError>,
    },

    #[error("Failed to checkout revision {revision}: {source}")]
    Checkout {
        revision: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to compute diff of revision {revision}: {source}")]
    Diff {
        revision: String,
        #[source]
        source: git2::Error,
    },

    #[error("Job source error: {0}")]
    JobSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported component type: {0}")]
    UnsupportedComponentType(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps any failure of the reconcile steps for `path`.
    pub fn reconciliation(path: impl Into<PathBuf>, source: AppError) -> Self {
        AppError::Reconciliation {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconciliation_error_names_path_and_cause() {
        let err = AppError::reconciliation(
            "/tmp/repos/app",
            AppError::Internal("remote hung up".to_string()),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/repos/app"));
        assert!(message.contains("remote hung up"));
    }

    #[test]
    fn reconciliation_error_exposes_its_cause() {
        let err = AppError::reconciliation("/tmp/repos/app", AppError::Git(git2::Error::from_str("not found")));
        let source = std::error::Error::source(&err).expect("cause");
        assert!(source.to_string().contains("not found"));
    }
}
