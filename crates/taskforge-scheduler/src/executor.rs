//! Execution adapter seam — the engine treats agent execution as an
//! opaque async operation with a duration and a boolean outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use taskforge_core::error::Result;
use taskforge_core::types::Task;

/// What the engine hands to the adapter per attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Worker/agent identifier (the assigned worker, or the task's
    /// category name when unassigned).
    pub agent_type: String,
    /// Prompt derived from the task description.
    pub user_prompt: String,
    /// Model override, when the caller routes by tier.
    pub model: Option<String>,
    /// Spec references and other structured inputs.
    pub inputs: serde_json::Value,
    pub project_id: String,
    pub user_id: Option<String>,
}

impl ExecutionRequest {
    /// Build a request from a task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            agent_type: task
                .assigned_worker
                .clone()
                .unwrap_or_else(|| task.category.to_string()),
            user_prompt: task.description.clone(),
            model: None,
            inputs: serde_json::json!({ "spec_refs": task.spec_refs }),
            project_id: task.project_id.clone(),
            user_id: None,
        }
    }
}

/// Adapter result. A `success: false` outcome and an `Err` from
/// `execute` are handled identically by the retry path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub output: String,
    /// Follow-up agent suggested by the adapter, if any.
    pub next_agent: Option<String>,
    /// Whether the adapter considers the phase gate satisfied.
    pub gate_ready: bool,
    /// Token/cost counters when the adapter reports them.
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub cost: Option<f64>,
}

/// The opaque execution adapter. Implementations call out to the agent
/// runtime; the engine only sees success/failure and the output.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome>;
}
