//! Task persistence and the execution event log.
//!
//! `save_task` and `update_task` are both idempotent upserts keyed by task
//! id, so replaying either against an existing row converges on the same
//! state.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use taskloom_core::{Task, TaskStatus, TaskType};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id           TEXT PRIMARY KEY,
    type         TEXT NOT NULL,
    description  TEXT NOT NULL,
    parameters   TEXT NOT NULL,
    status       TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    completed_at TEXT,
    result       TEXT,
    error        TEXT
);

CREATE TABLE IF NOT EXISTS execution_logs (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id   TEXT NOT NULL REFERENCES tasks (id),
    timestamp TEXT NOT NULL,
    event     TEXT NOT NULL,
    details   TEXT
);
";

/// One row of the execution event log.
#[derive(Debug, Clone)]
pub struct ExecutionEvent {
    /// Autoincrement row id.
    pub id: i64,
    /// The task this event belongs to.
    pub task_id: Uuid,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Short event name (e.g. "submitted", "completed").
    pub event: String,
    /// Optional structured payload.
    pub details: Option<Value>,
}

/// Task persistence over a [`Database`].
#[derive(Clone)]
pub struct TaskStore {
    db: Database,
}

impl TaskStore {
    /// Open a store over `db`, creating the schema if needed.
    pub async fn open(db: Database) -> StoreResult<Self> {
        db.execute(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        info!("task store schema ready");
        Ok(Self { db })
    }

    /// Persist a task. Idempotent upsert keyed by task id.
    pub async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let task = task.clone();
        debug!(task_id = %task.id, status = %task.status, "saving task");
        self.db.execute(move |conn| upsert_task(conn, &task)).await
    }

    /// Persist the current state of an already-saved task.
    ///
    /// Same upsert as [`TaskStore::save_task`]; an update for a task that
    /// was never saved simply inserts it.
    pub async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let task = task.clone();
        debug!(task_id = %task.id, status = %task.status, "updating task");
        self.db.execute(move |conn| upsert_task(conn, &task)).await
    }

    /// Load a task by id.
    pub async fn get_task(&self, id: Uuid) -> StoreResult<Task> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    "SELECT id, type, description, parameters, status, created_at,
                            completed_at, result, error
                     FROM tasks WHERE id = ?1",
                    params![id.to_string()],
                    task_from_row,
                )
                .optional()?
                .transpose()?
                .ok_or(StoreError::NotFound {
                    entity: "task",
                    id: id.to_string(),
                })
            })
            .await
    }

    /// Load all tasks, oldest first.
    pub async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, type, description, parameters, status, created_at,
                            completed_at, result, error
                     FROM tasks ORDER BY created_at",
                )?;
                let rows = stmt.query_map([], task_from_row)?;
                let mut tasks = Vec::new();
                for row in rows {
                    tasks.push(row??);
                }
                Ok(tasks)
            })
            .await
    }

    /// Append an event to a task's execution log.
    pub async fn log_event(
        &self,
        task_id: Uuid,
        event: impl Into<String>,
        details: Option<Value>,
    ) -> StoreResult<()> {
        let event = event.into();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO execution_logs (task_id, timestamp, event, details)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        task_id.to_string(),
                        Utc::now().to_rfc3339(),
                        event,
                        details.map(|d| d.to_string()),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Load a task's execution log, oldest first.
    pub async fn events_for(&self, task_id: Uuid) -> StoreResult<Vec<ExecutionEvent>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, task_id, timestamp, event, details
                     FROM execution_logs WHERE task_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![task_id.to_string()], event_from_row)?;
                let mut events = Vec::new();
                for row in rows {
                    events.push(row??);
                }
                Ok(events)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn upsert_task(conn: &Connection, task: &Task) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO tasks (id, type, description, parameters, status, created_at,
                            completed_at, result, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (id) DO UPDATE SET
             status = excluded.status,
             completed_at = excluded.completed_at,
             result = excluded.result,
             error = excluded.error",
        params![
            task.id.to_string(),
            task.task_type.to_string(),
            task.description,
            serde_json::to_string(&task.parameters)?,
            task.status.to_string(),
            task.created_at.to_rfc3339(),
            task.completed_at.map(|t| t.to_rfc3339()),
            task.result.as_ref().map(ToString::to_string),
            task.error,
        ],
    )?;
    Ok(())
}

/// Rebuild a [`Task`] from a row. Returns a nested result so rusqlite's
/// row-mapping error stays separate from our decode errors.
fn task_from_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<Task>> {
    let id: String = row.get(0)?;
    let task_type: String = row.get(1)?;
    let description: String = row.get(2)?;
    let parameters: String = row.get(3)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let completed_at: Option<String> = row.get(6)?;
    let result: Option<String> = row.get(7)?;
    let error: Option<String> = row.get(8)?;

    Ok(decode_task(
        id,
        task_type,
        description,
        parameters,
        status,
        created_at,
        completed_at,
        result,
        error,
    ))
}

#[allow(clippy::too_many_arguments)]
fn decode_task(
    id: String,
    task_type: String,
    description: String,
    parameters: String,
    status: String,
    created_at: String,
    completed_at: Option<String>,
    result: Option<String>,
    error: Option<String>,
) -> StoreResult<Task> {
    Ok(Task {
        id: parse_column("id", &id, |s| Uuid::parse_str(s).map_err(|e| e.to_string()))?,
        task_type: decode_enum::<TaskType>("type", &task_type)?,
        description,
        parameters: serde_json::from_str(&parameters)?,
        status: decode_enum::<TaskStatus>("status", &status)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        completed_at: completed_at
            .map(|t| parse_timestamp("completed_at", &t))
            .transpose()?,
        result: result.map(|r| serde_json::from_str(&r)).transpose()?,
        error,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<ExecutionEvent>> {
    let id: i64 = row.get(0)?;
    let task_id: String = row.get(1)?;
    let timestamp: String = row.get(2)?;
    let event: String = row.get(3)?;
    let details: Option<String> = row.get(4)?;

    Ok((|| {
        Ok(ExecutionEvent {
            id,
            task_id: parse_column("task_id", &task_id, |s| {
                Uuid::parse_str(s).map_err(|e| e.to_string())
            })?,
            timestamp: parse_timestamp("timestamp", &timestamp)?,
            event,
            details: details.map(|d| serde_json::from_str(&d)).transpose()?,
        })
    })())
}

fn parse_column<T>(
    column: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> StoreResult<T> {
    parse(raw).map_err(|reason| StoreError::CorruptColumn { column, reason })
}

fn parse_timestamp(column: &'static str, raw: &str) -> StoreResult<DateTime<Utc>> {
    parse_column(column, raw, |s| {
        DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| e.to_string())
    })
}

/// Decode a snake_case enum name persisted as text.
fn decode_enum<T: serde::de::DeserializeOwned>(
    column: &'static str,
    raw: &str,
) -> StoreResult<T> {
    serde_json::from_value(Value::String(raw.to_string())).map_err(|e| {
        StoreError::CorruptColumn {
            column,
            reason: e.to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
