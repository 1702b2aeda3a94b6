//! Capability inference rules — a declarative table mapping task text to
//! capability tags. Rules are plain data records so they can be extended
//! and tested independently, not a chain of conditionals.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;

use taskforge_core::error::{Result, TaskForgeError};
use taskforge_core::types::Task;

/// One inference rule: when `pattern` matches a task description, the
/// rule's tags join the required/preferred sets.
#[derive(Debug, Clone)]
pub struct CapabilityRule {
    pub pattern: Regex,
    pub required: Vec<String>,
    pub preferred: Vec<String>,
}

impl CapabilityRule {
    /// Build a rule from a pattern string (case-insensitive).
    pub fn new(pattern: &str, required: &[&str], preferred: &[&str]) -> Result<Self> {
        let regex = Regex::new(&format!("(?i){pattern}"))
            .map_err(|e| TaskForgeError::Config(format!("bad rule pattern '{pattern}': {e}")))?;
        Ok(Self {
            pattern: regex,
            required: required.iter().map(|s| s.to_string()).collect(),
            preferred: preferred.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Ordered rule list plus the spec-ref keyword table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CapabilityRule>,
}

/// TOML shape for user-supplied rule files.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rule: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    pattern: String,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    preferred: Vec<String>,
}

impl RuleSet {
    /// The built-in inference table.
    pub fn default_rules() -> Self {
        let table: &[(&str, &[&str], &[&str])] = &[
            ("PRD|requirements|scope", &["requirements", "prd"], &["planning"]),
            ("API|endpoint|REST|route", &["api"], &["typescript", "openapi"]),
            ("database|schema|prisma|migration", &["prisma"], &["database"]),
            (r"\bUI\b|component|frontend|react", &["react"], &["ui", "css"]),
            (r"test|coverage|\bQA\b", &["testing"], &["validation"]),
            ("validate|validation|zod", &["validation"], &["zod"]),
            ("deploy|infra|docker|pipeline", &["infra"], &["docker", "ci"]),
            ("docs|documentation|readme", &["docs"], &["markdown"]),
        ];
        // Built-in patterns are static and known-good; user-supplied rules
        // go through the fallible loader below.
        let rules = table
            .iter()
            .filter_map(|(p, req, pref)| CapabilityRule::new(p, req, pref).ok())
            .collect();
        Self { rules }
    }

    /// Load an extended rule set from a TOML file, appended after the
    /// built-in table.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskForgeError::Config(format!("Failed to read rules: {e}")))?;
        let file: RuleFile = toml::from_str(&content)
            .map_err(|e| TaskForgeError::Config(format!("Failed to parse rules: {e}")))?;

        let mut set = Self::default_rules();
        for entry in file.rule {
            let required: Vec<&str> = entry.required.iter().map(|s| s.as_str()).collect();
            let preferred: Vec<&str> = entry.preferred.iter().map(|s| s.as_str()).collect();
            set.rules.push(CapabilityRule::new(&entry.pattern, &required, &preferred)?);
        }
        Ok(set)
    }

    pub fn rules(&self) -> &[CapabilityRule] {
        &self.rules
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Capability tags inferred from a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredCapabilities {
    /// Tags the worker must cover.
    pub required: Vec<String>,
    /// Tags that improve the match but are not mandatory.
    pub preferred: Vec<String>,
}

/// Spec-ref substrings that imply capabilities regardless of description.
const SPEC_REF_TAGS: &[(&str, &[&str])] = &[
    ("openapi", &["api", "typescript"]),
    ("prisma", &["prisma"]),
    ("zod", &["validation"]),
];

fn push_unique(set: &mut Vec<String>, tag: &str) {
    let tag = tag.to_lowercase();
    if !set.contains(&tag) {
        set.push(tag);
    }
}

/// Infer required/preferred capability tags for a task from its
/// description and spec references. Union semantics across matching
/// rules; first-insertion order preserved for determinism.
pub fn infer_required_capabilities(task: &Task, rules: &RuleSet) -> InferredCapabilities {
    let mut inferred = InferredCapabilities::default();

    for rule in rules.rules() {
        if rule.pattern.is_match(&task.description) {
            for tag in &rule.required {
                push_unique(&mut inferred.required, tag);
            }
            for tag in &rule.preferred {
                push_unique(&mut inferred.preferred, tag);
            }
        }
    }

    for spec_ref in &task.spec_refs {
        let lower = spec_ref.to_lowercase();
        for (keyword, tags) in SPEC_REF_TAGS {
            if lower.contains(keyword) {
                for tag in *tags {
                    push_unique(&mut inferred.required, tag);
                }
            }
        }
    }

    tracing::debug!(
        task = %task.id,
        required = ?inferred.required,
        preferred = ?inferred.preferred,
        "inferred capabilities"
    );
    inferred
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::types::{Priority, WorkerCategory};

    fn make_task(description: &str) -> Task {
        Task::new("p1", description, WorkerCategory::Generation, Priority::Medium)
    }

    #[test]
    fn test_prd_rule() {
        let rules = RuleSet::default_rules();
        let task = make_task("Write the PRD and define the project scope");
        let inferred = infer_required_capabilities(&task, &rules);
        assert!(inferred.required.contains(&"requirements".to_string()));
        assert!(inferred.required.contains(&"prd".to_string()));
    }

    #[test]
    fn test_case_insensitive_patterns() {
        let rules = RuleSet::default_rules();
        let lower = infer_required_capabilities(&make_task("add a new api endpoint"), &rules);
        let upper = infer_required_capabilities(&make_task("Add a new API ENDPOINT"), &rules);
        assert_eq!(lower.required, upper.required);
        assert!(lower.required.contains(&"api".to_string()));
    }

    #[test]
    fn test_union_across_rules_no_duplicates() {
        let rules = RuleSet::default_rules();
        // Matches both the database rule and the validation rule.
        let task = make_task("Validate the prisma schema migration with zod");
        let inferred = infer_required_capabilities(&task, &rules);
        let prisma_count = inferred.required.iter().filter(|t| *t == "prisma").count();
        assert_eq!(prisma_count, 1);
        assert!(inferred.required.contains(&"validation".to_string()));
    }

    #[test]
    fn test_spec_refs_add_required_tags() {
        let rules = RuleSet::default_rules();
        let task = make_task("Implement the user listing").with_spec_refs(vec![
            "openapi.paths./users.get".into(),
            "prisma.models.User".into(),
        ]);
        let inferred = infer_required_capabilities(&task, &rules);
        assert!(inferred.required.contains(&"api".to_string()));
        assert!(inferred.required.contains(&"typescript".to_string()));
        assert!(inferred.required.contains(&"prisma".to_string()));
    }

    #[test]
    fn test_no_match_yields_empty_sets() {
        let rules = RuleSet::default_rules();
        let task = make_task("Assorted housekeeping");
        let inferred = infer_required_capabilities(&task, &rules);
        assert!(inferred.required.is_empty());
        assert!(inferred.preferred.is_empty());
    }

    #[test]
    fn test_insertion_order_is_deterministic() {
        let rules = RuleSet::default_rules();
        let task = make_task("Build API endpoint and database schema");
        let a = infer_required_capabilities(&task, &rules);
        let b = infer_required_capabilities(&task, &rules);
        assert_eq!(a.required, b.required);
        // API rule precedes the database rule in the table.
        assert_eq!(a.required[0], "api");
    }

    #[test]
    fn test_load_rules_from_toml() {
        let dir = std::env::temp_dir().join("taskforge-rules-test");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("rules.toml");
        std::fs::write(
            &path,
            "[[rule]]\npattern = \"grpc|protobuf\"\nrequired = [\"grpc\"]\npreferred = [\"protobuf\"]\n",
        )
        .unwrap();

        let rules = RuleSet::load_from(&path).unwrap();
        let task = make_task("Add a gRPC service");
        let inferred = infer_required_capabilities(&task, &rules);
        assert!(inferred.required.contains(&"grpc".to_string()));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let dir = std::env::temp_dir().join("taskforge-rules-bad");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("rules.toml");
        std::fs::write(&path, "[[rule]]\npattern = \"[unclosed\"\nrequired = [\"x\"]\n").unwrap();
        assert!(RuleSet::load_from(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
