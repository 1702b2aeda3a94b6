//! Core data model — tasks, workers, and match results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskForgeError};

/// Task priority — doubles as the scheduling lane identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Gate-blocking work — highest priority.
    Critical,
    /// User-visible pipeline work.
    High,
    /// Default for generated tasks.
    Medium,
    /// Background/cleanup work.
    Low,
}

impl Priority {
    /// Fixed ordinal order (lower = dispatched earlier in a batch).
    pub fn ordinal(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// All priorities in ordinal order.
    pub fn all() -> [Priority; 4] {
        [
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ]
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Which class of worker a task requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerCategory {
    /// Requirements analysis, task decomposition.
    Planning,
    /// Code/document generation.
    Generation,
    /// Review, testing, gate checks.
    Validation,
}

impl std::fmt::Display for WorkerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerCategory::Planning => write!(f, "planning"),
            WorkerCategory::Generation => write!(f, "generation"),
            WorkerCategory::Validation => write!(f, "validation"),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Assigned,
    Running,
    Complete,
    Blocked,
    Failed,
}

/// A unit of work flowing through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Free-text description — the input for capability inference.
    pub description: String,
    /// Which worker class must execute this.
    pub category: WorkerCategory,
    /// Scheduling lane.
    pub priority: Priority,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Spec-path references this task consumes (e.g. "openapi.paths.*").
    #[serde(default)]
    pub spec_refs: Vec<String>,
    /// Worker selected for this task, once matched.
    pub assigned_worker: Option<String>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a queued task with a fresh ID.
    pub fn new(
        project_id: &str,
        description: &str,
        category: WorkerCategory,
        priority: Priority,
    ) -> Self {
        Self {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            project_id: project_id.to_string(),
            description: description.to_string(),
            category,
            priority,
            status: TaskStatus::Queued,
            spec_refs: Vec::new(),
            assigned_worker: None,
            created_at: Utc::now(),
        }
    }

    /// Attach spec references (builder-style).
    pub fn with_spec_refs(mut self, refs: Vec<String>) -> Self {
        self.spec_refs = refs;
        self
    }

    /// Admission-time validation. Malformed tasks are rejected at the
    /// enqueue/match call, never silently defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TaskForgeError::Validation("task id is empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(TaskForgeError::Validation(format!(
                "task '{}' has an empty description",
                self.id
            )));
        }
        Ok(())
    }
}

/// Static catalog entry describing what a worker can do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerDefinition {
    /// Unique worker ID.
    pub worker_id: String,
    /// Worker class.
    pub category: WorkerCategory,
    /// Lowercase capability tags (e.g. "prisma", "react").
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Glob-like patterns for spec references this worker consumes.
    #[serde(default)]
    pub spec_consumption: Vec<String>,
    /// Cost/capability class: 1=fast/cheap, 2=balanced, 3=powerful.
    /// Informs routing policy, never the match score.
    #[serde(default = "default_tier")]
    pub tier: u8,
}

fn default_tier() -> u8 {
    2
}

impl WorkerDefinition {
    /// Validate a catalog entry. Fatal at load time.
    pub fn validate(&self) -> Result<()> {
        if self.worker_id.trim().is_empty() {
            return Err(TaskForgeError::Validation(
                "worker definition has an empty worker_id".into(),
            ));
        }
        if !(1..=3).contains(&self.tier) {
            return Err(TaskForgeError::Validation(format!(
                "worker '{}' has tier {} (expected 1..=3)",
                self.worker_id, self.tier
            )));
        }
        if self.capabilities.iter().any(|c| c.trim().is_empty()) {
            return Err(TaskForgeError::Validation(format!(
                "worker '{}' has an empty capability tag",
                self.worker_id
            )));
        }
        Ok(())
    }
}

/// Worker occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Busy,
}

/// Runtime instance of a worker. Capabilities start from the catalog
/// default but may be extended while the worker is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerState {
    pub worker_id: String,
    pub category: WorkerCategory,
    pub status: WorkerStatus,
    pub capabilities: Vec<String>,
    pub spec_consumption: Vec<String>,
}

impl WorkerState {
    /// Spawn an idle runtime instance from a catalog entry.
    pub fn from_definition(def: &WorkerDefinition) -> Self {
        Self {
            worker_id: def.worker_id.clone(),
            category: def.category,
            status: WorkerStatus::Idle,
            capabilities: def.capabilities.clone(),
            spec_consumption: def.spec_consumption.clone(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == WorkerStatus::Idle
    }
}

/// Weighted sub-scores behind a composite match score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Fraction of required tags satisfied (1.0 when none required).
    pub required_match: f64,
    /// Fraction of preferred tags satisfied (1.0 when none preferred).
    pub preferred_match: f64,
    /// Fraction of spec_refs covered by the worker's consumption globs.
    pub spec_coverage: f64,
    /// 1.0 for an idle worker, 0.0 for a busy one.
    pub availability: f64,
}

/// Ephemeral scoring output — produced and consumed within one match call.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub worker_id: String,
    /// Composite score in [0, 1].
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordinals() {
        assert_eq!(Priority::Critical.ordinal(), 0);
        assert_eq!(Priority::High.ordinal(), 1);
        assert_eq!(Priority::Medium.ordinal(), 2);
        assert_eq!(Priority::Low.ordinal(), 3);
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::Critical.to_string(), "critical");
        assert_eq!(Priority::Low.to_string(), "low");
    }

    #[test]
    fn test_task_validation() {
        let task = Task::new("p1", "Build the API layer", WorkerCategory::Generation, Priority::High);
        assert!(task.validate().is_ok());

        let mut bad = task.clone();
        bad.description = "  ".into();
        assert!(bad.validate().is_err());

        let mut bad = task;
        bad.id = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_worker_definition_validation() {
        let def = WorkerDefinition {
            worker_id: "gen-api".into(),
            category: WorkerCategory::Generation,
            capabilities: vec!["api".into(), "typescript".into()],
            spec_consumption: vec!["openapi.paths.*".into()],
            tier: 2,
        };
        assert!(def.validate().is_ok());

        let mut bad = def.clone();
        bad.tier = 5;
        assert!(bad.validate().is_err());

        let mut bad = def.clone();
        bad.worker_id = "".into();
        assert!(bad.validate().is_err());

        let mut bad = def;
        bad.capabilities.push(" ".into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_worker_state_from_definition() {
        let def = WorkerDefinition {
            worker_id: "plan-1".into(),
            category: WorkerCategory::Planning,
            capabilities: vec!["prd".into()],
            spec_consumption: vec![],
            tier: 1,
        };
        let state = WorkerState::from_definition(&def);
        assert!(state.is_idle());
        assert_eq!(state.worker_id, "plan-1");
        assert_eq!(state.capabilities, vec!["prd".to_string()]);
    }

    #[test]
    fn test_task_serde_roundtrip() {
        let task = Task::new("p1", "Add zod validation", WorkerCategory::Validation, Priority::Medium)
            .with_spec_refs(vec!["zod.schemas.user".into()]);
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.priority, Priority::Medium);
        assert_eq!(back.spec_refs.len(), 1);
    }
}
