//! Metrics sink seam — fire-and-forget observations per attempt.
//! The default sink logs through tracing; deployments with a real
//! metrics backend implement the trait themselves.

use taskforge_core::types::Priority;

/// Per-attempt execution record.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub agent_type: String,
    pub model: String,
    pub duration_secs: f64,
    pub success: bool,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub cost: Option<f64>,
}

/// Consumed fire-and-forget by the dispatch engine.
pub trait MetricsSink: Send + Sync {
    /// One completed execution attempt.
    fn record_execution(&self, record: &ExecutionRecord);
    /// Lane-labeled processing-duration observation.
    fn observe_lane_duration(&self, lane: Priority, duration_secs: f64);
    /// Error counter keyed by category/kind.
    fn incr_error(&self, category: &str, kind: &str);
}

/// Default sink — structured tracing events only.
#[derive(Debug, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_execution(&self, record: &ExecutionRecord) {
        tracing::info!(
            agent = %record.agent_type,
            model = %record.model,
            duration_secs = record.duration_secs,
            success = record.success,
            input_tokens = ?record.input_tokens,
            output_tokens = ?record.output_tokens,
            cost = ?record.cost,
            "execution recorded"
        );
    }

    fn observe_lane_duration(&self, lane: Priority, duration_secs: f64) {
        tracing::debug!(lane = %lane, duration_secs, "lane processing duration");
    }

    fn incr_error(&self, category: &str, kind: &str) {
        tracing::debug!(category, kind, "error counter incremented");
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording sink for assertions in engine tests.

    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingMetrics {
        pub executions: Mutex<Vec<ExecutionRecord>>,
        pub lane_durations: Mutex<Vec<(Priority, f64)>>,
        pub errors: Mutex<Vec<(String, String)>>,
    }

    impl MetricsSink for RecordingMetrics {
        fn record_execution(&self, record: &ExecutionRecord) {
            self.executions.lock().unwrap().push(record.clone());
        }

        fn observe_lane_duration(&self, lane: Priority, duration_secs: f64) {
            self.lane_durations.lock().unwrap().push((lane, duration_secs));
        }

        fn incr_error(&self, category: &str, kind: &str) {
            self.errors
                .lock()
                .unwrap()
                .push((category.to_string(), kind.to_string()));
        }
    }
}
