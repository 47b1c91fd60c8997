//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository snapshots, pure rules and atomic commits.
//! - Enforce ownership and visibility before exposing or mutating data.
//!
//! # Invariants
//! - A write that hits `RepoError::Conflict` is recomputed from a fresh
//!   snapshot, at most `MAX_WRITE_ATTEMPTS` times in total.

use crate::repo::RepoError;
use log::{error, warn};

pub mod access;
pub mod error;
pub mod exercise_service;
pub mod social_service;
pub mod user_service;
pub mod workout_service;

pub use error::{ErrorKind, ServiceError};

/// Attempts per write before reporting `ConcurrentModification`.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Runs `attempt` until it stops failing with a repository conflict.
///
/// `attempt` must reload its snapshot on every call.
pub(crate) fn with_conflict_retry<T>(
    operation: &'static str,
    mut attempt: impl FnMut() -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    for attempt_no in 1..=MAX_WRITE_ATTEMPTS {
        match attempt() {
            Err(ServiceError::Repo(RepoError::Conflict(details))) => {
                warn!(
                    "event={operation} module=service status=retry attempt={attempt_no} details={details}"
                );
            }
            other => return other,
        }
    }
    error!(
        "event={operation} module=service status=error error_code=concurrent_modification attempts={MAX_WRITE_ATTEMPTS}"
    );
    Err(ServiceError::ConcurrentModification)
}
