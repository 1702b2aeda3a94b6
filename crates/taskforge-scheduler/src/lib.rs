//! # TaskForge Scheduler
//!
//! Priority-lane dispatch engine with bounded per-lane concurrency,
//! retry-with-backoff, and fire-and-forget metrics.
//!
//! ## Design
//! - Four independent FIFO lanes (critical/high/medium/low), each with
//!   its own worker pool — a saturated low lane never delays critical.
//! - No external job-queue framework: lanes are explicit state machines
//!   (VecDeque + concurrency counter) driven by spawned tokio workers.
//! - Failed attempts re-enter the lane tail after exponential backoff
//!   via a detached timer task; the lane slot is never held across a
//!   backoff delay.
//! - Terminal outcomes (completed, permanently failed) are surfaced on
//!   an event channel; enqueue itself is fire-and-forget.
//!
//! ## Architecture
//! ```text
//! enqueue(task) ──▶ lane[priority] FIFO
//!                     │  (≤ max_concurrent workers per lane)
//!                     ▼
//!                 Executor (opaque adapter)
//!                     │
//!        ┌── success ─┴── failure ──┐
//!        ▼                          ▼
//!   completed log            attempts left? ── yes ─▶ sleep(backoff),
//!   + metrics + event               │                 re-enqueue at tail
//!                                   no
//!                                   ▼
//!                          failed log + metrics
//!                          + terminal Failed event
//! ```

pub mod engine;
pub mod executor;
pub mod job;
pub mod journal;
pub mod lanes;
pub mod metrics;

pub use engine::{DispatchEngine, JobEvent};
pub use executor::{ExecutionOutcome, ExecutionRequest, Executor};
pub use job::{Job, JobState, RetryPolicy};
pub use journal::JobJournal;
pub use lanes::{LaneBoard, LaneStats};
pub use metrics::{ExecutionRecord, MetricsSink, TracingMetrics};
