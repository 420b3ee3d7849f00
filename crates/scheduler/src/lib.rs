#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

//! # Scheduler
//!
//! Priority queue that publishes [`content::UniversalContent`] to one or
//! more platforms when it comes due, with bounded retries.

pub mod config;
pub mod error;
pub mod model;
pub mod publisher;
pub mod scheduler;
pub mod timing;

pub use config::SchedulerConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use model::{Priority, QueueStats, ScheduleOptions, ScheduleStatus, ScheduledContent};
pub use publisher::{ContentPublisher, PipelinePublisher};
pub use scheduler::ContentScheduler;
