//! Lane bookkeeping — four priority lanes, each an independent FIFO with
//! its own concurrency bound. A saturated low lane never blocks critical.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use taskforge_core::config::LaneConfig;
use taskforge_core::types::Priority;

use crate::job::Job;

/// Per-lane state.
struct LaneState {
    queue: VecDeque<Job>,
    active: usize,
    max_concurrent: usize,
    total_processed: u64,
}

impl LaneState {
    fn new(max_concurrent: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            active: 0,
            max_concurrent,
            total_processed: 0,
        }
    }

    fn enqueue(&mut self, job: Job) {
        self.queue.push_back(job);
    }

    fn dequeue(&mut self) -> Option<Job> {
        if self.active < self.max_concurrent {
            let job = self.queue.pop_front()?;
            self.active += 1;
            Some(job)
        } else {
            None
        }
    }

    fn complete(&mut self) {
        self.active = self.active.saturating_sub(1);
        self.total_processed += 1;
    }
}

/// The four lanes, indexed by priority ordinal.
pub struct LaneBoard {
    lanes: [Arc<Mutex<LaneState>>; 4],
}

impl LaneBoard {
    /// Build lanes with the configured concurrency limits.
    pub fn new(config: &LaneConfig) -> Self {
        Self {
            lanes: [
                Arc::new(Mutex::new(LaneState::new(config.max_concurrent(Priority::Critical)))),
                Arc::new(Mutex::new(LaneState::new(config.max_concurrent(Priority::High)))),
                Arc::new(Mutex::new(LaneState::new(config.max_concurrent(Priority::Medium)))),
                Arc::new(Mutex::new(LaneState::new(config.max_concurrent(Priority::Low)))),
            ],
        }
    }

    /// Append a job to the tail of its lane (strict FIFO within a lane).
    pub async fn submit(&self, job: Job) {
        let idx = job.lane.ordinal() as usize;
        let mut lane = self.lanes[idx].lock().await;
        tracing::debug!(
            lane = %job.lane,
            job = %job.id,
            queued = lane.queue.len(),
            active = lane.active,
            "lane enqueue"
        );
        lane.enqueue(job);
    }

    /// Pull the next pending job for one lane, consuming a concurrency
    /// slot. Returns None when the lane is empty or at capacity.
    pub async fn next(&self, lane: Priority) -> Option<Job> {
        let idx = lane.ordinal() as usize;
        let mut state = self.lanes[idx].lock().await;
        state.dequeue()
    }

    /// Release a concurrency slot after a job finishes an attempt.
    pub async fn release(&self, lane: Priority) {
        let idx = lane.ordinal() as usize;
        let mut state = self.lanes[idx].lock().await;
        state.complete();
    }

    /// Statistics snapshot for all lanes, in priority order.
    pub async fn stats(&self) -> Vec<LaneStats> {
        let mut result = Vec::with_capacity(4);
        for lane in Priority::all() {
            let state = self.lanes[lane.ordinal() as usize].lock().await;
            result.push(LaneStats {
                lane,
                queued: state.queue.len(),
                active: state.active,
                max_concurrent: state.max_concurrent,
                total_processed: state.total_processed,
            });
        }
        result
    }

    /// Total jobs queued or running across all lanes.
    pub async fn total_pending(&self) -> usize {
        let mut total = 0;
        for lane in &self.lanes {
            let state = lane.lock().await;
            total += state.queue.len() + state.active;
        }
        total
    }
}

/// Statistics for a single lane.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LaneStats {
    pub lane: Priority,
    pub queued: usize,
    pub active: usize,
    pub max_concurrent: usize,
    pub total_processed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RetryPolicy;
    use taskforge_core::types::{Task, WorkerCategory};

    fn make_job(priority: Priority) -> Job {
        let task = Task::new("p1", "work", WorkerCategory::Generation, priority);
        Job::new(task, &RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_fifo_within_lane() {
        let board = LaneBoard::new(&LaneConfig::default());
        let first = make_job(Priority::High);
        let first_id = first.id.clone();
        board.submit(first).await;
        board.submit(make_job(Priority::High)).await;

        let next = board.next(Priority::High).await.unwrap();
        assert_eq!(next.id, first_id);
    }

    #[tokio::test]
    async fn test_concurrency_limit() {
        // Low lane has concurrency 1.
        let board = LaneBoard::new(&LaneConfig::default());
        board.submit(make_job(Priority::Low)).await;
        board.submit(make_job(Priority::Low)).await;

        assert!(board.next(Priority::Low).await.is_some());
        // Second job blocked: lane at capacity.
        assert!(board.next(Priority::Low).await.is_none());

        board.release(Priority::Low).await;
        assert!(board.next(Priority::Low).await.is_some());
    }

    #[tokio::test]
    async fn test_lanes_independent() {
        let board = LaneBoard::new(&LaneConfig::default());
        board.submit(make_job(Priority::Low)).await;
        board.submit(make_job(Priority::Low)).await;
        board.submit(make_job(Priority::Critical)).await;

        // Saturate low.
        assert!(board.next(Priority::Low).await.is_some());
        assert!(board.next(Priority::Low).await.is_none());
        // Critical unaffected.
        assert!(board.next(Priority::Critical).await.is_some());
    }

    #[tokio::test]
    async fn test_stats() {
        let board = LaneBoard::new(&LaneConfig::default());
        board.submit(make_job(Priority::Critical)).await;
        board.submit(make_job(Priority::Medium)).await;

        let stats = board.stats().await;
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].queued, 1); // critical
        assert_eq!(stats[1].queued, 0); // high
        assert_eq!(stats[2].queued, 1); // medium
        assert_eq!(stats[0].max_concurrent, 5);
        assert_eq!(stats[3].max_concurrent, 1);
        assert_eq!(board.total_pending().await, 2);
    }
}
