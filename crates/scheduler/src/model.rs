//! Queue entries and their lifecycle.

use chrono::{DateTime, Utc};
use content::UniversalContent;
use platforms::{Platform, PublishingResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue priority. Higher priorities are processed first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// `pending -> processing -> completed | failed`; failed attempts go back to
/// `pending` while retries remain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ScheduleStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Options for [`crate::ContentScheduler::add_to_queue`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOptions {
    pub priority: Priority,
    /// Publish time; `None` means as soon as possible unless `auto_schedule`.
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Pick the next preferred posting hour for the target platforms.
    pub auto_schedule: bool,
}

/// One queued publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledContent {
    pub id: String,
    pub content: UniversalContent,
    pub platforms: Vec<Platform>,
    pub scheduled_time: DateTime<Utc>,
    pub priority: Priority,
    pub status: ScheduleStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Results of the most recent attempt.
    pub results: Vec<PublishingResult>,
    /// Platforms that failed while others succeeded.
    pub warnings: Vec<String>,
    pub last_error: Option<String>,
}

impl ScheduledContent {
    pub fn new(
        content: UniversalContent,
        platforms: Vec<Platform>,
        scheduled_time: DateTime<Utc>,
        priority: Priority,
        max_attempts: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            platforms,
            scheduled_time,
            priority,
            status: ScheduleStatus::Pending,
            attempts: 0,
            max_attempts,
            created_at: Utc::now(),
            last_attempt_at: None,
            finished_at: None,
            results: Vec::new(),
            warnings: Vec::new(),
            last_error: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Pending && self.scheduled_time <= now
    }
}

/// Queue counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Earliest pending publish time.
    pub next_due: Option<DateTime<Utc>>,
}

impl QueueStats {
    pub fn from_items(items: &[ScheduledContent]) -> Self {
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            match item.status {
                ScheduleStatus::Pending => {
                    stats.pending += 1;
                    stats.next_due = Some(
                        stats
                            .next_due
                            .map_or(item.scheduled_time, |t| t.min(item.scheduled_time)),
                    );
                }
                ScheduleStatus::Processing => stats.processing += 1,
                ScheduleStatus::Completed => stats.completed += 1,
                ScheduleStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
