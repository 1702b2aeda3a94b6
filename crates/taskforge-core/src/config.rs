//! TaskForge configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TaskForgeError};
use crate::types::Priority;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskForgeConfig {
    #[serde(default)]
    pub lanes: LaneConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Path to the worker catalog TOML file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("workers.toml")
}

impl Default for TaskForgeConfig {
    fn default() -> Self {
        Self {
            lanes: LaneConfig::default(),
            retry: RetryConfig::default(),
            retention: RetentionConfig::default(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// Per-lane concurrency limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    #[serde(default = "default_critical")]
    pub critical: usize,
    #[serde(default = "default_high")]
    pub high: usize,
    #[serde(default = "default_medium")]
    pub medium: usize,
    #[serde(default = "default_low")]
    pub low: usize,
}

fn default_critical() -> usize { 5 }
fn default_high() -> usize { 3 }
fn default_medium() -> usize { 2 }
fn default_low() -> usize { 1 }

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            medium: default_medium(),
            low: default_low(),
        }
    }
}

impl LaneConfig {
    /// Concurrency limit for a lane.
    pub fn max_concurrent(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// A zero-concurrency lane would never drain.
    pub fn validate(&self) -> Result<()> {
        for p in Priority::all() {
            if self.max_concurrent(p) == 0 {
                return Err(TaskForgeError::Config(format!(
                    "lane '{p}' has zero concurrency"
                )));
            }
        }
        Ok(())
    }
}

/// Retry policy defaults for failed executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff cap.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 2000 }
fn default_max_delay_ms() -> u64 { 60_000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// How many terminal jobs to keep around for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_keep_completed")]
    pub keep_completed: usize,
    #[serde(default = "default_keep_failed")]
    pub keep_failed: usize,
}

fn default_keep_completed() -> usize { 100 }
fn default_keep_failed() -> usize { 500 }

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_completed: default_keep_completed(),
            keep_failed: default_keep_failed(),
        }
    }
}

impl TaskForgeConfig {
    /// Load config from the default path, falling back to defaults when
    /// no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskForgeError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TaskForgeError::Config(format!("Failed to parse config: {e}")))?;
        config.lanes.validate()?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| TaskForgeError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Default config path (~/.taskforge/config.toml).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskforge")
            .join("config.toml")
    }
}
