//! Worker selection and greedy batch assignment.
//!
//! Absence of a match is a first-class return value here, never an error:
//! callers get `None` or an `unassigned` entry with a human-readable
//! reason.

use std::collections::{HashMap, HashSet};

use taskforge_core::types::{Task, TaskStatus, WorkerState};

use crate::rules::RuleSet;
use crate::score::{match_worker_to_task, MIN_SCORE};

/// One task→worker pairing from a batch pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Assignment {
    pub task_id: String,
    pub worker_id: String,
    pub score: f64,
}

/// Result of a greedy batch assignment pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BatchAssignment {
    /// Pairings in the order tasks were processed.
    pub assignments: Vec<Assignment>,
    /// Tasks that could not be assigned this pass.
    pub unassigned: Vec<String>,
    /// Why each unassigned task was skipped.
    pub reasons: HashMap<String, String>,
}

/// Pick the best idle worker for a task, or `None` when no idle worker
/// of the right category clears `MIN_SCORE`.
pub fn select_best_worker<'a>(
    task: &Task,
    workers: &'a [WorkerState],
    rules: &RuleSet,
) -> Option<&'a WorkerState> {
    let idle: Vec<WorkerState> = workers.iter().filter(|w| w.is_idle()).cloned().collect();
    if idle.is_empty() {
        return None;
    }

    let ranked = match_worker_to_task(task, &idle, rules);
    let best = ranked.first()?;
    if best.score < MIN_SCORE {
        tracing::debug!(
            task = %task.id,
            best = %best.worker_id,
            score = best.score,
            "best match below minimum score"
        );
        return None;
    }
    workers.iter().find(|w| w.worker_id == best.worker_id)
}

/// Greedy batch assignment: queued tasks in priority order, each taking
/// the best-scoring unclaimed idle worker of its category.
///
/// A worker claimed for an earlier task in the batch is excluded from
/// later candidates even though its persisted status has not been
/// updated yet — one pass never double-books a worker.
pub fn assign_tasks_to_workers(
    tasks: &[Task],
    workers: &[WorkerState],
    rules: &RuleSet,
) -> BatchAssignment {
    let mut eligible: Vec<&Task> = tasks.iter().filter(|t| t.status == TaskStatus::Queued).collect();
    // Stable: equal priorities keep submission order.
    eligible.sort_by_key(|t| t.priority.ordinal());

    let mut result = BatchAssignment::default();
    let mut claimed: HashSet<String> = HashSet::new();

    for task in eligible {
        let candidates: Vec<WorkerState> = workers
            .iter()
            .filter(|w| w.is_idle() && w.category == task.category && !claimed.contains(&w.worker_id))
            .cloned()
            .collect();

        if candidates.is_empty() {
            result.unassigned.push(task.id.clone());
            result.reasons.insert(
                task.id.clone(),
                format!("No available {} workers", task.category),
            );
            continue;
        }

        let ranked = match_worker_to_task(task, &candidates, rules);
        match ranked.first() {
            Some(best) if best.score >= MIN_SCORE => {
                tracing::debug!(
                    task = %task.id,
                    worker = %best.worker_id,
                    score = best.score,
                    "batch assignment"
                );
                claimed.insert(best.worker_id.clone());
                result.assignments.push(Assignment {
                    task_id: task.id.clone(),
                    worker_id: best.worker_id.clone(),
                    score: best.score,
                });
            }
            _ => {
                result.unassigned.push(task.id.clone());
                result.reasons.insert(
                    task.id.clone(),
                    "No worker meets minimum capability requirements".to_string(),
                );
            }
        }
    }

    result
}

/// Apply a batch result to the authoritative state: claimed workers go
/// busy and their tasks move to `Assigned` in the same pass, so a later
/// dispatch call never sees a half-applied assignment.
pub fn apply_assignments(
    result: &BatchAssignment,
    tasks: &mut [Task],
    workers: &mut [WorkerState],
) {
    use taskforge_core::types::WorkerStatus;

    for assignment in &result.assignments {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == assignment.task_id) {
            task.status = TaskStatus::Assigned;
            task.assigned_worker = Some(assignment.worker_id.clone());
        }
        if let Some(worker) = workers.iter_mut().find(|w| w.worker_id == assignment.worker_id) {
            worker.status = WorkerStatus::Busy;
        }
    }
}
