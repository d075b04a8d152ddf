//! Single-flight job gate.
//!
//! At most one job id is held at any instant. The scheduler tick and the
//! `/download` trigger both go through `try_acquire`, so only one of two
//! racing callers wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{AppError, Result};

#[derive(Debug, Default)]
pub struct JobCoordinator {
    current: Mutex<Option<String>>,
}

impl JobCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the gate for `job_id` if nobody holds it.
    pub fn try_acquire(&self, job_id: &str) -> bool {
        let mut current = self.state();
        if current.is_some() {
            return false;
        }
        *current = Some(job_id.to_string());
        true
    }

    /// Clears the gate whoever holds it.
    pub fn release(&self) {
        if let Some(job_id) = self.state().take() {
            tracing::debug!(job_id = %job_id, "Completed job");
        }
    }

    pub fn is_available(&self) -> bool {
        self.state().is_none()
    }

    pub fn current_job_id(&self) -> Option<String> {
        self.state().clone()
    }

    /// Like `try_acquire`, but hands back a permit that releases the gate
    /// when dropped.
    pub fn acquire(self: &Arc<Self>, job_id: &str) -> Result<JobPermit> {
        let mut current = self.state();
        if let Some(holder) = current.as_ref() {
            return Err(AppError::Busy {
                current: holder.clone(),
            });
        }
        *current = Some(job_id.to_string());

        Ok(JobPermit {
            coordinator: Arc::clone(self),
        })
    }
}

/// Exclusive right to run one job. Dropping it frees the coordinator.
#[derive(Debug)]
pub struct JobPermit {
    coordinator: Arc<JobCoordinator>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn second_acquire_fails_until_release() {
        let coordinator = JobCoordinator::new();
        assert!(coordinator.is_available());

        assert!(coordinator.try_acquire("job-1"));
        assert!(!coordinator.try_acquire("job-2"));
        assert_eq!(coordinator.current_job_id().as_deref(), Some("job-1"));
        assert!(!coordinator.is_available());

        coordinator.release();
        assert!(coordinator.is_available());
        assert!(coordinator.try_acquire("job-2"));
        assert_eq!(coordinator.current_job_id().as_deref(), Some("job-2"));
    }

    #[test]
    fn failed_acquire_has_no_side_effects() {
        let coordinator = JobCoordinator::new();
        assert!(coordinator.try_acquire("job-1"));
        assert!(!coordinator.try_acquire("job-1"));
        assert_eq!(coordinator.current_job_id().as_deref(), Some("job-1"));
    }

    #[test]
    fn release_is_idempotent() {
        let coordinator = JobCoordinator::new();
        coordinator.release();
        assert!(coordinator.try_acquire("job-1"));
        coordinator.release();
        coordinator.release();
        assert!(coordinator.is_available());
        assert_eq!(coordinator.current_job_id(), None);
    }

    #[test]
    fn concurrent_callers_have_a_single_winner() {
        let coordinator = Arc::new(JobCoordinator::new());
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    coordinator.try_acquire(&format!("job-{}", i))
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(!coordinator.is_available());
    }

    #[test]
    fn permit_releases_on_drop() {
        let coordinator = Arc::new(JobCoordinator::new());
        {
            let _permit = coordinator.acquire("job-1").unwrap();
            assert_eq!(coordinator.current_job_id().as_deref(), Some("job-1"));

            let err = coordinator.acquire("job-2").unwrap_err();
            assert!(matches!(err, AppError::Busy { current } if current == "job-1"));
        }
        assert!(coordinator.is_available());
    }

    #[test]
    fn permit_releases_when_holder_panics() {
        let coordinator = Arc::new(JobCoordinator::new());
        let shared = Arc::clone(&coordinator);

        let result = thread::spawn(move || {
            let _permit = shared.acquire("job-1").unwrap();
            panic!("job blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(coordinator.is_available());
    }
}
