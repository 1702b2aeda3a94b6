//! Dispatch engine — per-lane worker pools pulling jobs FIFO, executing
//! them through the adapter, and retrying failures with exponential
//! backoff until the attempt bound.
//!
//! Retry re-admission is a detached timer task: the lane's concurrency
//! slot is released the moment an attempt finishes, and the job rejoins
//! the tail of its original lane after the backoff elapses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex, Notify};

use taskforge_core::config::TaskForgeConfig;
use taskforge_core::error::{Result, TaskForgeError};
use taskforge_core::types::{Priority, Task, TaskStatus};

use crate::executor::{ExecutionRequest, Executor};
use crate::job::{Job, JobState, RetryPolicy};
use crate::journal::JobJournal;
use crate::lanes::{LaneBoard, LaneStats};
use crate::metrics::{ExecutionRecord, MetricsSink, TracingMetrics};

/// Idle lane workers re-check their queue at this interval as a backstop
/// for missed notify wakeups.
const IDLE_POLL_MS: u64 = 100;

/// Terminal job outcomes, surfaced to the caller on a channel.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Completed {
        job_id: String,
        task_id: String,
        lane: Priority,
        duration_secs: f64,
    },
    /// Attempts exhausted — the job will never be retried again.
    Failed {
        job_id: String,
        task_id: String,
        lane: Priority,
        attempts: u32,
        error: String,
    },
}

struct EngineInner {
    board: LaneBoard,
    wakeups: [Notify; 4],
    policy: RetryPolicy,
    keep_completed: usize,
    keep_failed: usize,
    executor: Arc<dyn Executor>,
    metrics: Arc<dyn MetricsSink>,
    events: mpsc::UnboundedSender<JobEvent>,
    completed: Mutex<VecDeque<Job>>,
    failed: Mutex<VecDeque<Job>>,
    journal: Option<std::sync::Mutex<JobJournal>>,
    shutdown: AtomicBool,
}

/// The priority-queue dispatch engine.
pub struct DispatchEngine {
    inner: Arc<EngineInner>,
    lane_config: taskforge_core::config::LaneConfig,
}

impl DispatchEngine {
    /// Build an engine. Returns the engine and the receiver for terminal
    /// job events. Call [`DispatchEngine::start`] to spawn lane workers.
    pub fn new(
        config: &TaskForgeConfig,
        executor: Arc<dyn Executor>,
    ) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        Self::with_metrics(config, executor, Arc::new(TracingMetrics))
    }

    /// Build with an explicit metrics sink.
    pub fn with_metrics(
        config: &TaskForgeConfig,
        executor: Arc<dyn Executor>,
        metrics: Arc<dyn MetricsSink>,
    ) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(EngineInner {
            board: LaneBoard::new(&config.lanes),
            wakeups: [Notify::new(), Notify::new(), Notify::new(), Notify::new()],
            policy: RetryPolicy::from(&config.retry),
            keep_completed: config.retention.keep_completed,
            keep_failed: config.retention.keep_failed,
            executor,
            metrics,
            events: tx,
            completed: Mutex::new(VecDeque::new()),
            failed: Mutex::new(VecDeque::new()),
            journal: None,
            shutdown: AtomicBool::new(false),
        });
        (
            Self {
                inner,
                lane_config: config.lanes.clone(),
            },
            rx,
        )
    }

    /// Attach a job journal before starting. Must be called while the
    /// engine has a single owner.
    pub fn attach_journal(&mut self, journal: JobJournal) -> Result<()> {
        let inner = Arc::get_mut(&mut self.inner).ok_or_else(|| {
            TaskForgeError::Queue("cannot attach journal after start".into())
        })?;
        inner.journal = Some(std::sync::Mutex::new(journal));
        Ok(())
    }

    /// Spawn the per-lane worker pools (concurrency workers per lane).
    pub fn start(&self) {
        for lane in Priority::all() {
            let pool_size = self.lane_config.max_concurrent(lane);
            tracing::info!(lane = %lane, workers = pool_size, "lane pool started");
            for _ in 0..pool_size {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    lane_worker(inner, lane).await;
                });
            }
        }
    }

    /// Admit a task into the lane matching its priority. Non-blocking;
    /// outcomes arrive on the event channel, not through a return value.
    pub async fn enqueue(&self, task: Task) -> Result<()> {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return Err(TaskForgeError::Queue("engine is shut down".into()));
        }
        task.validate()?;

        let job = Job::new(task, &self.inner.policy);
        let lane = job.lane;
        tracing::info!(job = %job.id, task = %job.task.id, lane = %lane, "job admitted");
        self.inner.persist(&job);
        self.inner.board.submit(job).await;
        self.inner.wakeups[lane.ordinal() as usize].notify_one();
        Ok(())
    }

    /// Lane statistics snapshot.
    pub async fn stats(&self) -> Vec<LaneStats> {
        self.inner.board.stats().await
    }

    /// Jobs queued or running across all lanes.
    pub async fn pending(&self) -> usize {
        self.inner.board.total_pending().await
    }

    /// Most recent completed jobs (retention-bounded, newest last).
    pub async fn recent_completed(&self) -> Vec<Job> {
        self.inner.completed.lock().await.iter().cloned().collect()
    }

    /// Most recent permanently failed jobs (retention-bounded).
    pub async fn recent_failed(&self) -> Vec<Job> {
        self.inner.failed.lock().await.iter().cloned().collect()
    }

    /// Stop pulling new jobs. In-flight jobs finish or error out on
    /// their own; there is no cancellation.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        for wakeup in &self.inner.wakeups {
            wakeup.notify_waiters();
        }
        tracing::info!("dispatch engine shutting down");
    }
}

async fn lane_worker(inner: Arc<EngineInner>, lane: Priority) {
    loop {
        if inner.shutdown.load(Ordering::SeqCst) {
            break;
        }
        match inner.board.next(lane).await {
            Some(job) => run_job(&inner, job).await,
            None => {
                let wakeup = &inner.wakeups[lane.ordinal() as usize];
                tokio::select! {
                    _ = wakeup.notified() => {}
                    _ = tokio::time::sleep(std::time::Duration::from_millis(IDLE_POLL_MS)) => {}
                }
            }
        }
    }
}

impl EngineInner {
    fn persist(&self, job: &Job) {
        if let Some(journal) = &self.journal {
            if let Ok(guard) = journal.lock() {
                if let Err(e) = guard.save(job) {
                    tracing::warn!(job = %job.id, "journal save failed: {e}");
                }
            }
        }
    }

    fn prune_journal(&self) {
        if let Some(journal) = &self.journal {
            if let Ok(guard) = journal.lock() {
                if let Err(e) = guard.prune(self.keep_completed, self.keep_failed) {
                    tracing::warn!("journal prune failed: {e}");
                }
            }
        }
    }

    async fn complete_job(
        &self,
        mut job: Job,
        request: &ExecutionRequest,
        duration_secs: f64,
        outcome: crate::executor::ExecutionOutcome,
    ) {
        job.state = JobState::Completed;
        job.progress = 100;
        job.completed_at = Some(Utc::now());
        job.task.status = TaskStatus::Complete;
        self.persist(&job);

        self.metrics.record_execution(&ExecutionRecord {
            agent_type: request.agent_type.clone(),
            model: request.model.clone().unwrap_or_else(|| "default".into()),
            duration_secs,
            success: true,
            input_tokens: outcome.input_tokens,
            output_tokens: outcome.output_tokens,
            cost: outcome.cost,
        });

        tracing::info!(
            job = %job.id,
            lane = %job.lane,
            duration_secs,
            "job completed"
        );

        let event = JobEvent::Completed {
            job_id: job.id.clone(),
            task_id: job.task.id.clone(),
            lane: job.lane,
            duration_secs,
        };

        let mut completed = self.completed.lock().await;
        completed.push_back(job);
        while completed.len() > self.keep_completed {
            completed.pop_front();
        }
        drop(completed);

        self.prune_journal();
        let _ = self.events.send(event);
    }
}

/// One execution attempt for a dequeued job.
async fn run_job(inner: &Arc<EngineInner>, mut job: Job) {
    job.state = JobState::Running;
    job.attempts += 1;
    job.started_at = Some(Utc::now());
    job.task.status = TaskStatus::Running;
    inner.persist(&job);
    tracing::debug!(job = %job.id, lane = %job.lane, attempt = job.attempts, "job running");

    let request = ExecutionRequest::from_task(&job.task);
    let start = Instant::now();
    let result = inner.executor.execute(&request).await;
    let duration_secs = start.elapsed().as_secs_f64();

    // The slot is released before any retry delay: backoff never holds
    // lane capacity.
    inner.board.release(job.lane).await;
    inner.metrics.observe_lane_duration(job.lane, duration_secs);

    match result {
        Ok(outcome) if outcome.success => {
            inner.complete_job(job, &request, duration_secs, outcome).await;
        }
        Ok(outcome) => {
            let error = if outcome.output.is_empty() {
                "execution reported failure".to_string()
            } else {
                outcome.output
            };
            fail_attempt(inner, job, &request, duration_secs, error).await;
        }
        Err(e) => {
            fail_attempt(inner, job, &request, duration_secs, e.to_string()).await;
        }
    }
}

/// Failed attempt: retry with backoff while attempts remain, otherwise
/// mark the job permanently failed and surface it.
async fn fail_attempt(
    inner: &Arc<EngineInner>,
    mut job: Job,
    request: &ExecutionRequest,
    duration_secs: f64,
    error: String,
) {
    job.progress = 0;
    job.last_error = Some(error.clone());
    inner.metrics.incr_error("execution", &request.agent_type);

    if job.can_retry() {
        let delay = inner.policy.delay_for(job.attempts);
        tracing::warn!(
            job = %job.id,
            lane = %job.lane,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying: {error}"
        );

        job.state = JobState::Pending;
        job.task.status = TaskStatus::Queued;
        inner.persist(&job);

        // Delayed re-admission at the lane tail. The lane slot was
        // already released; only this timer task waits.
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let lane = job.lane;
            inner.board.submit(job).await;
            inner.wakeups[lane.ordinal() as usize].notify_one();
        });
        return;
    }

    job.state = JobState::Failed;
    job.completed_at = Some(Utc::now());
    job.task.status = TaskStatus::Failed;
    inner.persist(&job);

    inner.metrics.record_execution(&ExecutionRecord {
        agent_type: request.agent_type.clone(),
        model: request.model.clone().unwrap_or_else(|| "default".into()),
        duration_secs,
        success: false,
        input_tokens: None,
        output_tokens: None,
        cost: None,
    });

    tracing::error!(
        job = %job.id,
        lane = %job.lane,
        attempts = job.attempts,
        "job permanently failed: {error}"
    );

    let event = JobEvent::Failed {
        job_id: job.id.clone(),
        task_id: job.task.id.clone(),
        lane: job.lane,
        attempts: job.attempts,
        error,
    };

    let mut failed = inner.failed.lock().await;
    failed.push_back(job);
    while failed.len() > inner.keep_failed {
        failed.pop_front();
    }
    drop(failed);

    inner.prune_journal();
    let _ = inner.events.send(event);
}
