//! # TaskForge Core
//!
//! Shared data model, configuration, and error types for the TaskForge
//! dispatch engine. Nothing here performs I/O beyond config loading.

pub mod config;
pub mod error;
pub mod types;

pub use config::{LaneConfig, RetentionConfig, RetryConfig, TaskForgeConfig};
pub use error::{Result, TaskForgeError};
pub use types::{
    MatchResult, Priority, ScoreBreakdown, Task, TaskStatus, WorkerCategory, WorkerDefinition,
    WorkerState, WorkerStatus,
};
