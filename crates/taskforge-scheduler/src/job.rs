//! Job definitions — the queue item wrapping a task with retry metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskforge_core::types::{Priority, Task};

/// Retry policy for failed executions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// First retry delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
        }
    }
}

impl From<&taskforge_core::config::RetryConfig> for RetryPolicy {
    fn from(config: &taskforge_core::config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base · 2^(n−1),
    /// capped so the backoff never grows unbounded.
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        std::time::Duration::from_millis(ms)
    }
}

/// Job lifecycle. `Pending` is re-entered from `Running` on a failed
/// attempt while attempts remain; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A queued unit of execution, owned by the dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID.
    pub id: String,
    /// The wrapped task.
    pub task: Task,
    /// Lane this job was admitted to; never changes after admission.
    pub lane: Priority,
    /// Attempts consumed so far.
    pub attempts: u32,
    /// Attempt bound from the retry policy at enqueue time.
    pub max_attempts: u32,
    pub state: JobState,
    /// Observational progress: 100 on success, 0 on failure/reset.
    pub progress: u8,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Message from the most recent failed attempt.
    pub last_error: Option<String>,
}

impl Job {
    /// Wrap a task for admission. The lane is fixed by the task's
    /// priority here and never re-evaluated.
    pub fn new(task: Task, policy: &RetryPolicy) -> Self {
        Self {
            id: format!("job-{}", uuid::Uuid::new_v4()),
            lane: task.priority,
            task,
            attempts: 0,
            max_attempts: policy.max_attempts,
            state: JobState::Pending,
            progress: 0,
            enqueued_at: Utc::now(),
            started_at: None,
            completed_at: None,
            last_error: None,
        }
    }

    /// Whether a failed attempt leaves retries on the table.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Wall-clock duration of the last run, when known.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}
