//! Priority queue with a periodic publishing loop.

use chrono::{DateTime, Utc};
use content::UniversalContent;
use platforms::{Platform, PublishingResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::model::{QueueStats, ScheduleOptions, ScheduleStatus, ScheduledContent};
use crate::publisher::ContentPublisher;
use crate::timing;

const MIN_TICK: Duration = Duration::from_millis(100);

struct Inner {
    config: SchedulerConfig,
    publisher: Arc<dyn ContentPublisher>,
    queue: Mutex<Vec<ScheduledContent>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    /// Set to ask the loop to exit once the current item is done.
    shutdown: watch::Sender<bool>,
}

/// Queue of content waiting to be published.
///
/// Cloning is cheap; clones share the same queue and loop.
#[derive(Clone)]
pub struct ContentScheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ContentScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentScheduler")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// What one attempt produced.
enum Outcome {
    Completed { warnings: Vec<String> },
    Retry { error: String },
    Failed { error: String },
}

impl ContentScheduler {
    pub fn new(publisher: Arc<dyn ContentPublisher>, config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                publisher,
                queue: Mutex::new(Vec::new()),
                ticker: Mutex::new(None),
                shutdown: watch::channel(false).0,
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Queue `content` for `platforms` and return the new item's id.
    #[instrument(skip(self, content, options), fields(title = %content.title))]
    pub async fn add_to_queue(
        &self,
        content: UniversalContent,
        platforms: Vec<Platform>,
        options: ScheduleOptions,
    ) -> SchedulerResult<String> {
        if platforms.is_empty() {
            return Err(SchedulerError::NoPlatforms);
        }

        let now = Utc::now();
        let scheduled_time = match options.scheduled_time {
            Some(time) => time,
            None if options.auto_schedule => timing::next_posting_time(&platforms, now),
            None => now,
        };

        let item = ScheduledContent::new(
            content,
            platforms,
            scheduled_time,
            options.priority,
            self.inner.config.max_attempts,
        );
        let id = item.id.clone();
        info!(
            id = %id,
            priority = %item.priority,
            scheduled_time = %item.scheduled_time,
            platforms = ?item.platforms,
            "Content queued"
        );

        {
            let mut queue = self.inner.queue.lock().await;
            queue.push(item);
            sort_queue(&mut queue);
        }

        if self.inner.config.auto_start {
            self.start().await;
        }
        Ok(id)
    }

    /// Remove a pending item.
    pub async fn remove_from_queue(&self, id: &str) -> SchedulerResult<ScheduledContent> {
        let mut queue = self.inner.queue.lock().await;
        let index = position(&queue, id)?;
        let status = queue[index].status;
        if status != ScheduleStatus::Pending {
            return Err(SchedulerError::NotPending {
                id: id.to_string(),
                status,
            });
        }
        info!(id = %id, "Content removed from queue");
        Ok(queue.remove(index))
    }

    /// Move a pending item to a new publish time.
    pub async fn reschedule(&self, id: &str, time: DateTime<Utc>) -> SchedulerResult<()> {
        let mut queue = self.inner.queue.lock().await;
        let index = position(&queue, id)?;
        let item = &mut queue[index];
        if item.status != ScheduleStatus::Pending {
            return Err(SchedulerError::NotPending {
                id: id.to_string(),
                status: item.status,
            });
        }
        item.scheduled_time = time;
        info!(id = %id, scheduled_time = %time, "Content rescheduled");
        sort_queue(&mut queue);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<ScheduledContent> {
        let queue = self.inner.queue.lock().await;
        queue.iter().find(|item| item.id == id).cloned()
    }

    /// Snapshot of the queue in processing order.
    pub async fn items(&self) -> Vec<ScheduledContent> {
        self.inner.queue.lock().await.clone()
    }

    pub async fn stats(&self) -> QueueStats {
        QueueStats::from_items(&self.inner.queue.lock().await)
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the sweep loop. Does nothing if it is already running.
    pub async fn start(&self) {
        let mut ticker = self.inner.ticker.lock().await;
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let interval = self.inner.config.tick_interval.max(MIN_TICK);
        let scheduler = self.clone();
        self.inner.shutdown.send_replace(false);
        let mut shutdown = self.inner.shutdown.subscribe();
        info!(interval_secs = interval.as_secs(), "Starting content scheduler");
        *ticker = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = timer.tick() => {}
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }
                let processed = scheduler.sweep(Some(&shutdown)).await;
                if processed > 0 {
                    debug!(processed, "Queue sweep finished");
                }
            }
        }));
    }

    /// Stop the sweep loop.
    ///
    /// An item that is being published is finished and recorded first, so
    /// nothing is left in `Processing`.
    pub async fn stop(&self) {
        let Some(handle) = self.inner.ticker.lock().await.take() else {
            return;
        };
        self.inner.shutdown.send_replace(true);
        if let Err(e) = handle.await {
            error!(error = %e, "Content scheduler loop ended abnormally");
        }
        info!("Content scheduler stopped");
    }

    /// Process every due pending item, one at a time, then prune finished
    /// items. Returns the number of items processed.
    pub async fn process_queue(&self) -> usize {
        self.sweep(None).await
    }

    /// One pass over the due items. With `shutdown`, stops between items once
    /// it is set.
    async fn sweep(&self, shutdown: Option<&watch::Receiver<bool>>) -> usize {
        let now = Utc::now();
        let due: Vec<String> = {
            let queue = self.inner.queue.lock().await;
            queue
                .iter()
                .filter(|item| item.is_due(now))
                .map(|item| item.id.clone())
                .collect()
        };

        let mut processed = 0;
        for id in &due {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                debug!(processed, "Sweep interrupted by stop");
                break;
            }
            match self.process_item(id).await {
                Ok(_) => processed += 1,
                Err(e) => debug!(id = %id, error = %e, "Skipped queued item"),
            }
        }

        self.prune().await;
        processed
    }

    /// Run one attempt for a pending item and return its new status.
    #[instrument(skip(self))]
    pub async fn process_item(&self, id: &str) -> SchedulerResult<ScheduleStatus> {
        let (content, platforms) = {
            let mut queue = self.inner.queue.lock().await;
            let index = position(&queue, id)?;
            let item = &mut queue[index];
            if item.status != ScheduleStatus::Pending {
                return Err(SchedulerError::NotPending {
                    id: id.to_string(),
                    status: item.status,
                });
            }
            item.status = ScheduleStatus::Processing;
            item.attempts += 1;
            item.last_attempt_at = Some(Utc::now());
            (item.content.clone(), item.platforms.clone())
        };

        let publisher = &self.inner.publisher;
        let (outcome, results) = if self.inner.config.auto_test {
            let report = publisher.check_compatibility(&content, &platforms);
            if report.compatible {
                let results = publisher.publish_all(&content, &platforms).await;
                (evaluate(&results), results)
            } else {
                let failed: Vec<String> = report
                    .failed_platforms()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                let error = format!("Content is incompatible with: {}", failed.join(", "));
                (Outcome::Failed { error }, Vec::new())
            }
        } else {
            let results = publisher.publish_all(&content, &platforms).await;
            (evaluate(&results), results)
        };

        let mut queue = self.inner.queue.lock().await;
        let index = position(&queue, id)?;
        let item = &mut queue[index];
        item.results = results;
        let now = Utc::now();

        match outcome {
            Outcome::Completed { warnings } => {
                item.status = ScheduleStatus::Completed;
                item.finished_at = Some(now);
                item.last_error = None;
                if warnings.is_empty() {
                    info!(id = %id, attempts = item.attempts, "Content published");
                } else {
                    warn!(id = %id, warnings = ?warnings, "Content published with failures");
                }
                item.warnings = warnings;
            }
            Outcome::Retry { error } if item.attempts < item.max_attempts => {
                let retry_at = now
                    + chrono::Duration::from_std(self.inner.config.retry_delay)
                        .unwrap_or_else(|_| chrono::Duration::minutes(5));
                warn!(
                    id = %id,
                    attempts = item.attempts,
                    max_attempts = item.max_attempts,
                    retry_at = %retry_at,
                    error = %error,
                    "Publishing failed, will retry"
                );
                item.status = ScheduleStatus::Pending;
                item.scheduled_time = retry_at;
                item.last_error = Some(error);
                sort_queue(&mut queue);
                return Ok(ScheduleStatus::Pending);
            }
            Outcome::Retry { error } | Outcome::Failed { error } => {
                error!(id = %id, attempts = item.attempts, error = %error, "Publishing failed");
                item.status = ScheduleStatus::Failed;
                item.finished_at = Some(now);
                item.last_error = Some(error);
            }
        }
        Ok(item.status)
    }

    /// Keep only the most recent finished items.
    async fn prune(&self) {
        let retention = self.inner.config.retention;
        let mut queue = self.inner.queue.lock().await;

        let mut finished: Vec<(DateTime<Utc>, String)> = queue
            .iter()
            .filter(|item| item.status.is_finished())
            .map(|item| (item.finished_at.unwrap_or(item.created_at), item.id.clone()))
            .collect();
        if finished.len() <= retention {
            return;
        }

        finished.sort_by(|a, b| b.0.cmp(&a.0));
        let dropped: Vec<String> = finished
            .split_off(retention)
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        queue.retain(|item| !dropped.contains(&item.id));
        debug!(pruned = dropped.len(), "Pruned finished queue items");
    }
}

fn position(queue: &[ScheduledContent], id: &str) -> SchedulerResult<usize> {
    queue
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
}

/// Priority descending, then publish time ascending.
fn sort_queue(queue: &mut [ScheduledContent]) {
    queue.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.scheduled_time.cmp(&b.scheduled_time))
    });
}

fn evaluate(results: &[PublishingResult]) -> Outcome {
    let failed: Vec<&PublishingResult> = results.iter().filter(|r| !r.success).collect();
    if failed.is_empty() {
        return Outcome::Completed {
            warnings: Vec::new(),
        };
    }

    let describe = |r: &PublishingResult| {
        if r.errors.is_empty() {
            r.platform.to_string()
        } else {
            format!("{}: {}", r.platform, r.errors.join("; "))
        }
    };

    if failed.len() < results.len() {
        Outcome::Completed {
            warnings: failed
                .iter()
                .map(|r| format!("Failed to publish to {}", describe(*r)))
                .collect(),
        }
    } else {
        Outcome::Retry {
            error: failed
                .iter()
                .map(|r| describe(*r))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}
