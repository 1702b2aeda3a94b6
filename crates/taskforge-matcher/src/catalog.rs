//! Worker catalog — the immutable set of worker definitions, loaded from
//! TOML at startup. Malformed entries are fatal at load time.

use serde::Deserialize;
use std::path::Path;

use taskforge_core::error::{Result, TaskForgeError};
use taskforge_core::types::{WorkerCategory, WorkerDefinition, WorkerState};

/// TOML shape: a list of `[[worker]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    worker: Vec<WorkerDefinition>,
}

/// Read-only worker catalog.
#[derive(Debug, Clone, Default)]
pub struct WorkerCatalog {
    definitions: Vec<WorkerDefinition>,
}

impl WorkerCatalog {
    /// Build a catalog from definitions, validating every entry.
    pub fn new(definitions: Vec<WorkerDefinition>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for def in &definitions {
            def.validate()?;
            if !seen.insert(def.worker_id.clone()) {
                return Err(TaskForgeError::Catalog(format!(
                    "duplicate worker_id '{}'",
                    def.worker_id
                )));
            }
        }
        Ok(Self { definitions })
    }

    /// Load and validate a catalog from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskForgeError::Catalog(format!("Failed to read catalog: {e}")))?;
        let file: CatalogFile = toml::from_str(&content)
            .map_err(|e| TaskForgeError::Catalog(format!("Failed to parse catalog: {e}")))?;
        let catalog = Self::new(file.worker)?;
        tracing::info!("Loaded worker catalog: {} definitions", catalog.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[WorkerDefinition] {
        &self.definitions
    }

    /// Look up a definition by worker id.
    pub fn get(&self, worker_id: &str) -> Option<&WorkerDefinition> {
        self.definitions.iter().find(|d| d.worker_id == worker_id)
    }

    /// All definitions of one category, in catalog order.
    pub fn by_category(&self, category: WorkerCategory) -> Vec<&WorkerDefinition> {
        self.definitions.iter().filter(|d| d.category == category).collect()
    }

    /// Spawn one idle runtime instance per catalog entry.
    pub fn spawn_all(&self) -> Vec<WorkerState> {
        self.definitions.iter().map(WorkerState::from_definition).collect()
    }
}
