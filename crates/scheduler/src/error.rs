//! Scheduler errors.

use thiserror::Error;

use crate::model::ScheduleStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// No queued item has this id
    #[error("Scheduled item not found: {0}")]
    NotFound(String),

    /// Only pending items can be removed or rescheduled
    #[error("Scheduled item {id} is {status}, expected pending")]
    NotPending { id: String, status: ScheduleStatus },

    /// Content must target at least one platform
    #[error("No target platforms given")]
    NoPlatforms,

    /// Invalid `SCHEDULER_*` value
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
