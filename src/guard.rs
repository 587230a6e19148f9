// src/guard.rs

//! Single-flight admission for job runs.
//!
//! The worker shares one container-runtime daemon and one host network
//! namespace between all jobs, so at most one job body may run at a time.
//! [`SingleFlightGuard::acquire`] either hands out the only [`JobToken`] or
//! rejects the caller immediately; there is no waiting and no queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, error};

/// Returned by [`SingleFlightGuard::acquire`] while another job holds the token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("another job is already running on this worker")]
pub struct ConcurrencyViolation;

/// Admits at most one in-flight job.
///
/// Cloning the guard shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct SingleFlightGuard {
    active: Arc<AtomicBool>,
}

/// Proof that the holder is the only running job.
///
/// The token is neither `Clone` nor released on drop: it must be handed back
/// through [`SingleFlightGuard::release`] (or [`SingleFlightGuard::poison`]).
/// A token that is dropped instead keeps the worker busy forever.
#[must_use = "a job token must be released or poisoned"]
#[derive(Debug)]
pub struct JobToken {
    active: Arc<AtomicBool>,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to become the active job.
    pub fn acquire(&self) -> Result<JobToken, ConcurrencyViolation> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                debug!("job start rejected; a job is already active");
                ConcurrencyViolation
            })?;

        Ok(JobToken {
            active: Arc::clone(&self.active),
        })
    }

    /// Hand the token back, allowing the next job to start.
    ///
    /// # Panics
    ///
    /// Panics if `token` was issued by a different guard.
    pub fn release(&self, token: JobToken) {
        assert!(
            Arc::ptr_eq(&self.active, &token.active),
            "job token released to a guard that did not issue it"
        );
        let was_active = self.active.swap(false, Ordering::AcqRel);
        debug_assert!(was_active, "released a token while no job was active");
    }

    /// Consume the token without clearing the active flag.
    ///
    /// Used after a fatal teardown failure: leftover containers would break
    /// the next job, so this guard never admits another one.
    pub fn poison(&self, token: JobToken) {
        assert!(
            Arc::ptr_eq(&self.active, &token.active),
            "job token poisoned on a guard that did not issue it"
        );
        error!("single-flight guard poisoned; no further jobs will be admitted");
        drop(token);
    }

    /// Whether a job currently holds the token.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
