//! # TaskForge Matcher
//!
//! Capability-based task/worker matching: pattern-based requirement
//! inference, weighted multi-criteria scoring, and greedy bipartite
//! batch assignment.
//!
//! Pure functions over injected catalogs and rule sets — no I/O beyond
//! loading the declarative tables at startup, no ambient globals, and no
//! errors for ordinary unmatched cases (those are first-class results).
//!
//! ```text
//! Task ──▶ infer_required_capabilities (rule table + spec-ref keywords)
//!      ──▶ match_worker_to_task (0.4 required + 0.2 preferred
//!                                + 0.2 spec coverage + 0.2 availability)
//!      ──▶ select_best_worker / assign_tasks_to_workers (MIN_SCORE 0.3)
//! ```

pub mod assign;
pub mod catalog;
pub mod rules;
pub mod score;

pub use assign::{
    apply_assignments, assign_tasks_to_workers, select_best_worker, Assignment, BatchAssignment,
};
pub use catalog::WorkerCatalog;
pub use rules::{infer_required_capabilities, CapabilityRule, InferredCapabilities, RuleSet};
pub use score::{match_worker_to_task, MIN_SCORE};
