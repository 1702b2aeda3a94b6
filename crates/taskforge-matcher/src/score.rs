//! Weighted multi-criteria scoring of workers against a task.
//!
//! Composite score = 0.4·required + 0.2·preferred + 0.2·spec_coverage
//! + 0.2·availability. Weights are fixed design constants; vacuous
//! sub-terms count as fully satisfied and are never renormalized away.

use regex::Regex;

use taskforge_core::types::{MatchResult, ScoreBreakdown, Task, WorkerState};

use crate::rules::{infer_required_capabilities, InferredCapabilities, RuleSet};

pub const WEIGHT_REQUIRED: f64 = 0.4;
pub const WEIGHT_PREFERRED: f64 = 0.2;
pub const WEIGHT_SPEC_COVERAGE: f64 = 0.2;
pub const WEIGHT_AVAILABILITY: f64 = 0.2;

/// Minimum composite score for a worker to be assignable.
pub const MIN_SCORE: f64 = 0.3;

/// A required tag `r` is satisfied by a worker capability `c` when either
/// contains the other, case-insensitively. Tolerates naming variance
/// ("api" vs "rest-api").
fn tag_satisfied(required: &str, capabilities: &[String]) -> bool {
    let r = required.to_lowercase();
    capabilities.iter().any(|c| {
        let c = c.to_lowercase();
        r.contains(&c) || c.contains(&r)
    })
}

/// Fraction of tags satisfied; 1.0 when the tag set is empty.
fn tag_coverage(tags: &[String], capabilities: &[String]) -> f64 {
    if tags.is_empty() {
        return 1.0;
    }
    let satisfied = tags.iter().filter(|t| tag_satisfied(t, capabilities)).count();
    satisfied as f64 / tags.len() as f64
}

/// Translate a spec-consumption glob into an anchored regex: `*` becomes
/// `.*`, everything else is literal.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');
    for ch in pattern.chars() {
        if ch == '*' {
            regex.push_str(".*");
        } else {
            regex.push_str(&regex::escape(&ch.to_string()));
        }
    }
    regex.push('$');
    Regex::new(&regex).ok()
}

/// Fraction of the task's spec_refs matched by at least one of the
/// worker's consumption globs; 1.0 when the task declares none.
fn spec_coverage(spec_refs: &[String], consumption: &[String]) -> f64 {
    if spec_refs.is_empty() {
        return 1.0;
    }
    let patterns: Vec<Regex> = consumption.iter().filter_map(|p| glob_to_regex(p)).collect();
    let covered = spec_refs
        .iter()
        .filter(|r| patterns.iter().any(|p| p.is_match(r)))
        .count();
    covered as f64 / spec_refs.len() as f64
}

/// Score one worker against inferred capabilities.
fn score_worker(task: &Task, worker: &WorkerState, inferred: &InferredCapabilities) -> MatchResult {
    let required_match = tag_coverage(&inferred.required, &worker.capabilities);
    let preferred_match = tag_coverage(&inferred.preferred, &worker.capabilities);
    let coverage = spec_coverage(&task.spec_refs, &worker.spec_consumption);
    let availability = if worker.is_idle() { 1.0 } else { 0.0 };

    let score = WEIGHT_REQUIRED * required_match
        + WEIGHT_PREFERRED * preferred_match
        + WEIGHT_SPEC_COVERAGE * coverage
        + WEIGHT_AVAILABILITY * availability;

    MatchResult {
        worker_id: worker.worker_id.clone(),
        score,
        breakdown: ScoreBreakdown {
            required_match,
            preferred_match,
            spec_coverage: coverage,
            availability,
        },
    }
}

/// Score every candidate of the task's category and return them ranked
/// descending. The sort is stable: ties keep candidate iteration order.
pub fn match_worker_to_task(
    task: &Task,
    candidates: &[WorkerState],
    rules: &RuleSet,
) -> Vec<MatchResult> {
    let inferred = infer_required_capabilities(task, rules);

    let mut results: Vec<MatchResult> = candidates
        .iter()
        .filter(|w| w.category == task.category)
        .map(|w| score_worker(task, w, &inferred))
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::types::{Priority, WorkerCategory, WorkerStatus};

    fn worker(id: &str, caps: &[&str], consumption: &[&str]) -> WorkerState {
        WorkerState {
            worker_id: id.into(),
            category: WorkerCategory::Generation,
            status: WorkerStatus::Idle,
            capabilities: caps.iter().map(|s| s.to_string()).collect(),
            spec_consumption: consumption.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn plain_task(description: &str) -> Task {
        Task::new("p1", description, WorkerCategory::Generation, Priority::Medium)
    }

    #[test]
    fn test_vacuous_task_scores_full_availability() {
        // No rules match, no spec refs: every idle worker scores exactly 1.0.
        let rules = RuleSet::default_rules();
        let task = plain_task("miscellaneous chore");
        let workers = vec![worker("w1", &[], &[])];

        let results = match_worker_to_task(&task, &workers, &rules);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-9);

        let mut busy = worker("w2", &[], &[]);
        busy.status = WorkerStatus::Busy;
        let results = match_worker_to_task(&task, &[busy], &rules);
        assert!((results[0].score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_bidirectional_containment() {
        let caps = vec!["rest-api".to_string()];
        assert!(tag_satisfied("api", &caps));
        let caps = vec!["api".to_string()];
        assert!(tag_satisfied("rest-api", &caps));
        assert!(!tag_satisfied("prisma", &caps));
    }

    #[test]
    fn test_adding_capabilities_never_lowers_score() {
        let rules = RuleSet::default_rules();
        let task = plain_task("Build the API endpoint with prisma schema access");

        let sparse = worker("w1", &["api"], &[]);
        let rich = worker("w1", &["api", "prisma", "typescript"], &[]);

        let sparse_score = match_worker_to_task(&task, &[sparse], &rules)[0].score;
        let rich_score = match_worker_to_task(&task, &[rich], &rules)[0].score;
        assert!(rich_score >= sparse_score);
    }

    #[test]
    fn test_spec_coverage_glob() {
        let refs = vec!["openapi.paths./users.get".to_string()];
        let consumption = vec!["openapi.paths.*".to_string()];
        assert!((spec_coverage(&refs, &consumption) - 1.0).abs() < 1e-9);

        let consumption = vec!["prisma.models.*".to_string()];
        assert_eq!(spec_coverage(&refs, &consumption), 0.0);
    }

    #[test]
    fn test_glob_is_anchored_and_literal() {
        // No glob star: must match the whole reference exactly.
        let refs = vec!["openapi.paths".to_string()];
        assert!((spec_coverage(&refs, &["openapi.paths".to_string()]) - 1.0).abs() < 1e-9);
        assert_eq!(spec_coverage(&refs, &["openapi".to_string()]), 0.0);
        // Dots are literal, not regex wildcards.
        assert_eq!(spec_coverage(&["openapiXpaths".to_string()], &["openapi.paths".to_string()]), 0.0);
    }

    #[test]
    fn test_category_filter() {
        let rules = RuleSet::default_rules();
        let task = plain_task("anything");
        let mut planner = worker("planner", &[], &[]);
        planner.category = WorkerCategory::Planning;
        let results = match_worker_to_task(&task, &[planner], &rules);
        assert!(results.is_empty());
    }

    #[test]
    fn test_ranking_descending_and_stable() {
        let rules = RuleSet::default_rules();
        let task = plain_task("Build the API endpoint");
        let strong = worker("strong", &["api", "typescript", "openapi"], &[]);
        let weak = worker("weak", &[], &[]);
        let tied_a = worker("tied-a", &["api", "typescript", "openapi"], &[]);

        let results = match_worker_to_task(&task, &[weak.clone(), strong, tied_a], &rules);
        assert_eq!(results[0].worker_id, "strong");
        // Equal scores keep input order.
        assert_eq!(results[1].worker_id, "tied-a");
        assert_eq!(results[2].worker_id, "weak");
    }

    #[test]
    fn test_minimum_score_scenario() {
        // 0/2 required, 0/2 preferred, 0% coverage, idle → 0.2 exactly.
        let task = plain_task("chore").with_spec_refs(vec!["openapi.paths./x".into()]);
        let inferred = InferredCapabilities {
            required: vec!["grpc".into(), "kafka".into()],
            preferred: vec!["terraform".into(), "helm".into()],
        };
        let w = worker("w", &["cobol"], &["prisma.*"]);
        let result = score_worker(&task, &w, &inferred);
        assert!((result.score - 0.2).abs() < 1e-9);
        assert!(result.score < MIN_SCORE);
    }
}
