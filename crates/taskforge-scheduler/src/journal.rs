//! SQLite-backed job journal — optional persistence for queue items.
//! The engine runs fully in-memory without one; attaching a journal makes
//! job state transitions survive restarts and inspectable offline.

use rusqlite::Connection;
use std::path::Path;

use taskforge_core::error::{Result, TaskForgeError};

use crate::job::{Job, JobState};

/// Persistent record of jobs and their state transitions.
pub struct JobJournal {
    conn: Connection,
}

impl JobJournal {
    /// Open or create the journal database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| TaskForgeError::Database(format!("journal open: {e}")))?;
        let journal = Self { conn };
        journal.migrate()?;
        Ok(journal)
    }

    /// In-memory journal for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TaskForgeError::Database(format!("journal open: {e}")))?;
        let journal = Self { conn };
        journal.migrate()?;
        Ok(journal)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                lane TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                task_json TEXT NOT NULL,
                last_error TEXT,
                enqueued_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state);
            CREATE INDEX IF NOT EXISTS idx_jobs_lane ON jobs(lane);
         ",
            )
            .map_err(|e| TaskForgeError::Database(format!("journal migration: {e}")))?;
        Ok(())
    }

    /// Insert or update a job row.
    pub fn save(&self, job: &Job) -> Result<()> {
        let state = match job.state {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        let task_json = serde_json::to_string(&job.task)
            .map_err(|e| TaskForgeError::Database(format!("task serialize: {e}")))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO jobs
                 (id, task_id, project_id, lane, state, attempts, max_attempts, progress,
                  task_json, last_error, enqueued_at, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    job.id,
                    job.task.id,
                    job.task.project_id,
                    job.lane.to_string(),
                    state,
                    job.attempts,
                    job.max_attempts,
                    job.progress,
                    task_json,
                    job.last_error,
                    job.enqueued_at.to_rfc3339(),
                    job.started_at.map(|t| t.to_rfc3339()),
                    job.completed_at.map(|t| t.to_rfc3339()),
                ],
            )
            .map_err(|e| TaskForgeError::Database(format!("journal save: {e}")))?;
        Ok(())
    }

    /// Count jobs in a given state.
    pub fn count_state(&self, state: JobState) -> Result<usize> {
        let name = match state {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM jobs WHERE state = ?1", [name], |row| row.get(0))
            .map_err(|e| TaskForgeError::Database(format!("journal count: {e}")))?;
        Ok(count as usize)
    }

    /// Most recent job rows as JSON summaries (newest first).
    pub fn recent(&self, limit: usize) -> Vec<serde_json::Value> {
        let mut stmt = match self.conn.prepare(
            "SELECT id, task_id, lane, state, attempts, last_error, enqueued_at, completed_at
             FROM jobs ORDER BY enqueued_at DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        stmt.query_map([limit as i64], |row| {
            Ok(serde_json::json!({
                "id": row.get::<_, String>(0)?,
                "task_id": row.get::<_, String>(1)?,
                "lane": row.get::<_, String>(2)?,
                "state": row.get::<_, String>(3)?,
                "attempts": row.get::<_, u32>(4)?,
                "last_error": row.get::<_, Option<String>>(5)?,
                "enqueued_at": row.get::<_, String>(6)?,
                "completed_at": row.get::<_, Option<String>>(7)?,
            }))
        })
        .ok()
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    /// Prune terminal rows beyond the retention bounds, oldest first.
    pub fn prune(&self, keep_completed: usize, keep_failed: usize) -> Result<()> {
        for (state, keep) in [("completed", keep_completed), ("failed", keep_failed)] {
            self.conn
                .execute(
                    "DELETE FROM jobs WHERE state = ?1 AND id NOT IN (
                        SELECT id FROM jobs WHERE state = ?1
                        ORDER BY completed_at DESC LIMIT ?2
                    )",
                    rusqlite::params![state, keep as i64],
                )
                .map_err(|e| TaskForgeError::Database(format!("journal prune: {e}")))?;
        }
        Ok(())
    }
}
