//! Error types shared across the TaskForge crates.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TaskForgeError>;

/// All errors the engine can surface.
#[derive(Debug, Error)]
pub enum TaskForgeError {
    /// Configuration file missing, unreadable, or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// A task or worker definition failed admission-time validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Worker catalog could not be loaded or contains bad entries.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The execution adapter reported a failure.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Queue/engine lifecycle error (e.g. enqueue after shutdown).
    #[error("Queue error: {0}")]
    Queue(String),

    /// Job journal (SQLite) error.
    #[error("Database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
