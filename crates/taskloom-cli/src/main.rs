//! CLI entry point for Taskloom.
//!
//! This binary provides the `taskloom` command with demo subcommands that
//! drive the full task pipeline, the workflow engine, and the error
//! recovery system, plus a status view over the task store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskloom_core::{TaskStatus, TaskType};
use taskloom_recovery::{
    BoxError, ErrorCategory, ErrorHandler, Operation, RetryStrategy,
};
use taskloom_runtime::Orchestrator;
use taskloom_store::{Database, TaskStore};
use taskloom_vault::CredentialStore;

/// Environment prefix for credentials, e.g. `TASKLOOM_SECRET_MAIL_API_KEY`.
const SECRET_PREFIX: &str = "TASKLOOM_SECRET_";

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Taskloom — an automation task orchestration platform.
#[derive(Parser)]
#[command(
    name = "taskloom",
    version,
    about = "Taskloom — automation task orchestration",
    long_about = "Orchestrates heterogeneous automation tasks through a queueing and \
                  execution pipeline with tiered error recovery and a node-graph \
                  workflow engine."
)]
struct Cli {
    /// Path to the task database. In-memory when omitted.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit and execute a batch of sample automation tasks.
    Demo,

    /// Build and execute a sample multi-node workflow.
    WorkflowDemo,

    /// Exercise error classification and recovery.
    ErrorsDemo,

    /// Show task counts and stored credentials.
    Status,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("info");
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Demo => cmd_demo(cli.db).await,
        Commands::WorkflowDemo => cmd_workflow_demo(cli.db).await,
        Commands::ErrorsDemo => cmd_errors_demo().await,
        Commands::Status => cmd_status(cli.db).await,
    }
}

fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_orchestrator(db_path: Option<PathBuf>) -> Result<Orchestrator> {
    let db = match &db_path {
        Some(path) => Database::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?,
        None => Database::open_in_memory().context("failed to open in-memory database")?,
    };
    let store = TaskStore::open(db)
        .await
        .context("failed to initialize task store")?;

    let credentials = CredentialStore::from_env(SECRET_PREFIX);
    Ok(Orchestrator::new(store, credentials))
}

// ---------------------------------------------------------------------------
// Subcommand: demo
// ---------------------------------------------------------------------------

async fn cmd_demo(db_path: Option<PathBuf>) -> Result<()> {
    let mut orch = open_orchestrator(db_path).await?;

    info!("submitting sample tasks");
    let samples = [
        (
            TaskType::WebAutomation,
            "Open Chrome and search for AI automation tools",
        ),
        (TaskType::MobileAutomation, "Open the mail app and check inbox"),
        (TaskType::DesktopAutomation, "Launch the report editor"),
        (TaskType::DataProcessing, "Aggregate this week's metrics"),
    ];
    for (task_type, description) in samples {
        let id = orch.submit(task_type, description, HashMap::new()).await?;
        println!("submitted {task_type}: {id}");
    }

    let results = orch.execute_all().await?;
    for result in &results {
        println!("{}", serde_json::to_string_pretty(result)?);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&orch.statistics())?
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: workflow-demo
// ---------------------------------------------------------------------------

async fn cmd_workflow_demo(db_path: Option<PathBuf>) -> Result<()> {
    let mut orch = open_orchestrator(db_path).await?;

    let wf = orch
        .workflows()
        .create_workflow("Daily Report", "Fetch metrics, record them, tell the team");
    let nodes = [
        ("http_request", "Fetch Metrics", json!({ "url": "https://metrics.example.com/daily" })),
        ("spreadsheet", "Record Metrics", json!({ "operation": "append" })),
        ("mail_send", "Email Report", json!({ "to": "team@example.com", "subject": "Daily Report" })),
        ("chat_post", "Announce", json!({ "channel": "#reports", "text": "Daily report sent" })),
    ];
    for (i, (node_type, name, params)) in nodes.into_iter().enumerate() {
        let parameters = params
            .as_object()
            .map(|o| o.clone().into_iter().collect())
            .unwrap_or_default();
        orch.workflows()
            .add_node(wf.id, node_type, name, parameters, (i as i64 * 200, 0))?;
    }

    let task_id = orch
        .submit(
            TaskType::WorkflowAutomation,
            "run the daily report workflow",
            HashMap::from([("workflow_id".to_string(), json!(wf.id.to_string()))]),
        )
        .await?;
    println!("submitted workflow task {task_id} for workflow {}", wf.id);

    if let Some(result) = orch.execute_next().await? {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&orch.workflows().statistics())?
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: errors-demo
// ---------------------------------------------------------------------------

/// Succeeds on the third attempt, so a retrying strategy recovers it.
struct EventuallyHealthy {
    attempts: AtomicU32,
}

#[async_trait]
impl Operation for EventuallyHealthy {
    async fn run(&self) -> Result<(), BoxError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < 3 {
            return Err(format!("connection reset (attempt {attempt})").into());
        }
        Ok(())
    }
}

async fn cmd_errors_demo() -> Result<()> {
    let mut handler = ErrorHandler::new();
    handler.register_strategy(
        ErrorCategory::Network,
        Box::new(RetryStrategy::new(3, Duration::from_millis(100))),
    );

    let operation = EventuallyHealthy {
        attempts: AtomicU32::new(0),
    };
    let samples: [(&str, Option<&dyn Operation>); 4] = [
        ("Network connection failed while fetching metrics", Some(&operation)),
        ("invalid input format in task parameters", None),
        ("unauthorized access to spreadsheet", None),
        ("fatal system crash in adapter host", None),
    ];

    for (message, op) in samples {
        let context = handler
            .handle_message(message, op, HashMap::new())
            .await;
        println!(
            "{} -> category={} severity={} recovered={}",
            context.id, context.category, context.severity, context.recovery_successful
        );
    }

    println!("{}", serde_json::to_string_pretty(&handler.statistics())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

async fn cmd_status(db_path: Option<PathBuf>) -> Result<()> {
    let orch = open_orchestrator(db_path).await?;

    let tasks = orch.store().list_tasks().await?;
    let mut by_status: HashMap<String, usize> = HashMap::new();
    for task in &tasks {
        *by_status.entry(task.status.to_string()).or_default() += 1;
    }
    let completed = by_status
        .get(&TaskStatus::Completed.to_string())
        .copied()
        .unwrap_or(0);

    println!("tasks: {} total, {} completed", tasks.len(), completed);
    for (status, count) in &by_status {
        println!("  {status}: {count}");
    }

    let credentials = orch.credentials();
    println!("credentials: {} loaded", credentials.len());
    for name in credentials.names() {
        println!("  {name}: ****");
    }

    Ok(())
}
