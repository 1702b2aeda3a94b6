//! # TaskForge CLI
//!
//! Dry-run surface for the dispatch core: validate a worker catalog, or
//! run a batch assignment pass over a task file and print the pairings.
//!
//! Usage:
//!   taskforge validate --catalog workers.toml
//!   taskforge plan --catalog workers.toml --tasks batch.json
//!   taskforge run --catalog workers.toml --tasks batch.json

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use taskforge_core::types::Task;
use taskforge_core::TaskForgeConfig;
use taskforge_matcher::{apply_assignments, assign_tasks_to_workers, RuleSet, WorkerCatalog};
use taskforge_scheduler::{
    DispatchEngine, ExecutionOutcome, ExecutionRequest, Executor, JobEvent,
};

#[derive(Parser)]
#[command(
    name = "taskforge",
    version,
    about = "Capability-based task/worker matching and priority dispatch"
)]
struct Cli {
    /// Config file path (defaults to ~/.taskforge/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate the worker catalog
    Validate {
        /// Catalog path (overrides the config's catalog_path)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run a batch assignment pass over a JSON task file
    Plan {
        /// Catalog path (overrides the config's catalog_path)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// JSON file holding an array of tasks
        #[arg(long)]
        tasks: PathBuf,
        /// Extra capability rules (TOML), appended to the built-ins
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Assign a task batch and dispatch it through the priority lanes
    /// with a simulated executor (end-to-end smoke run)
    Run {
        /// Catalog path (overrides the config's catalog_path)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// JSON file holding an array of tasks
        #[arg(long)]
        tasks: PathBuf,
        /// Simulated per-task execution time in milliseconds
        #[arg(long, default_value = "250")]
        task_ms: u64,
    },
}

/// Stand-in adapter for smoke runs: sleeps, then succeeds.
struct SimulatedExecutor {
    delay: std::time::Duration,
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> taskforge_core::Result<ExecutionOutcome> {
        tokio::time::sleep(self.delay).await;
        Ok(ExecutionOutcome {
            success: true,
            output: format!("simulated run for {}", request.agent_type),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let config = match &cli.config {
        Some(path) => TaskForgeConfig::load_from(path)?,
        None => TaskForgeConfig::load()?,
    };

    match cli.command {
        Command::Validate { catalog } => {
            let path = catalog.unwrap_or_else(|| config.catalog_path.clone());
            let catalog = WorkerCatalog::load_from(&path)
                .with_context(|| format!("catalog validation failed: {}", path.display()))?;
            println!("OK: {} worker definitions", catalog.len());
            for def in catalog.definitions() {
                println!(
                    "  {} [{}] tier {} — {} capabilities, {} spec patterns",
                    def.worker_id,
                    def.category,
                    def.tier,
                    def.capabilities.len(),
                    def.spec_consumption.len()
                );
            }
            Ok(())
        }
        Command::Plan { catalog, tasks, rules } => {
            let catalog_path = catalog.unwrap_or_else(|| config.catalog_path.clone());
            let catalog = WorkerCatalog::load_from(&catalog_path)?;
            let rules = match rules {
                Some(path) => RuleSet::load_from(&path)?,
                None => RuleSet::default_rules(),
            };

            let content = std::fs::read_to_string(&tasks)
                .with_context(|| format!("failed to read {}", tasks.display()))?;
            let batch: Vec<Task> = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", tasks.display()))?;
            for task in &batch {
                task.validate()?;
            }

            let workers = catalog.spawn_all();
            let result = assign_tasks_to_workers(&batch, &workers, &rules);

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.unassigned.is_empty() {
                std::process::exit(2);
            }
            Ok(())
        }
        Command::Run { catalog, tasks, task_ms } => {
            let catalog_path = catalog.unwrap_or_else(|| config.catalog_path.clone());
            let catalog = WorkerCatalog::load_from(&catalog_path)?;
            let rules = RuleSet::default_rules();

            let content = std::fs::read_to_string(&tasks)
                .with_context(|| format!("failed to read {}", tasks.display()))?;
            let mut batch: Vec<Task> = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", tasks.display()))?;
            for task in &batch {
                task.validate()?;
            }

            let mut workers = catalog.spawn_all();
            let result = assign_tasks_to_workers(&batch, &workers, &rules);
            apply_assignments(&result, &mut batch, &mut workers);
            for id in &result.unassigned {
                tracing::warn!(task = %id, reason = %result.reasons[id], "task left unassigned");
            }

            let executor = Arc::new(SimulatedExecutor {
                delay: std::time::Duration::from_millis(task_ms),
            });
            let (engine, mut events) = DispatchEngine::new(&config, executor);
            engine.start();

            let mut expected = 0usize;
            for task in batch {
                if task.assigned_worker.is_some() {
                    engine.enqueue(task).await?;
                    expected += 1;
                }
            }

            let mut done = 0usize;
            while done < expected {
                match events.recv().await {
                    Some(JobEvent::Completed { task_id, lane, duration_secs, .. }) => {
                        tracing::info!(task = %task_id, %lane, duration_secs, "completed");
                        done += 1;
                    }
                    Some(JobEvent::Failed { task_id, attempts, error, .. }) => {
                        tracing::error!(task = %task_id, attempts, "failed: {error}");
                        done += 1;
                    }
                    None => break,
                }
            }

            for stat in engine.stats().await {
                tracing::info!(
                    lane = %stat.lane,
                    processed = stat.total_processed,
                    "lane drained"
                );
            }
            engine.shutdown();
            Ok(())
        }
    }
}
