//! Task creation, lookup and assignee management.

use super::{Database, new_id, now_ms, optional};
use crate::types::{NewTask, Task};
use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};
use std::collections::BTreeSet;

/// Columns selected for a full task row, in `parse_task_row` order.
pub const TASK_COLUMNS: &str = "t.id, t.list_id, t.parent_task_id, t.name, t.description, \
     t.status, t.priority, t.due_date, t.created_at, t.updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        list_id: row.get("list_id")?,
        parent_task_id: row.get("parent_task_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Normalize a date or datetime string to an RFC 3339 UTC timestamp with
/// second precision, e.g. `2025-03-01T00:00:00Z`.
///
/// Accepts full RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) and
/// bare `YYYY-MM-DD` (midnight UTC). Stored due dates always use this form so
/// that string order is chronological order.
pub fn normalize_due_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        naive.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?.and_utc()
    } else {
        return None;
    };
    Some(parsed.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    optional(stmt.query_row(params![task_id], parse_task_row))
}

impl Database {
    /// Create a new task in a list.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let due_date = match input.due_date.as_deref() {
            Some(raw) => Some(
                normalize_due_date(raw).ok_or_else(|| anyhow!("Invalid due_date: {}", raw))?,
            ),
            None => None,
        };
        let now = now_ms();
        let task = Task {
            id: new_id(),
            list_id: input.list_id,
            parent_task_id: input.parent_task_id,
            name: input.name,
            description: input.description,
            status: Some(input.status.unwrap_or_else(|| "to_do".to_string())),
            priority: input.priority,
            due_date,
            created_at: input.created_at.unwrap_or(now),
            updated_at: input.created_at.unwrap_or(now),
        };

        self.with_conn(|conn| {
            if let Some(ref parent_id) = task.parent_task_id {
                let parent = get_task_internal(conn, parent_id)?
                    .ok_or_else(|| anyhow!("Parent task not found: {}", parent_id))?;
                if parent.list_id != task.list_id {
                    return Err(anyhow!("Parent task {} is in a different list", parent_id));
                }
            }
            conn.execute(
                "INSERT INTO tasks (id, list_id, parent_task_id, name, description, status,
                                    priority, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    task.id,
                    task.list_id,
                    task.parent_task_id,
                    task.name,
                    task.description,
                    task.status,
                    task.priority,
                    task.due_date,
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(task_id = %task.id, list_id = %task.list_id, "created task");
        Ok(task)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Replace a task's assignees.
    ///
    /// `None` leaves assignees unchanged, an empty slice clears them, and any
    /// other value replaces them with the de-duplicated set.
    pub fn set_task_assignees(&self, task_id: &str, user_ids: Option<&[String]>) -> Result<()> {
        let Some(user_ids) = user_ids else {
            return Ok(());
        };
        let unique: BTreeSet<&str> = user_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .collect();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM task_assignees WHERE task_id = ?1", params![task_id])?;
            for user_id in unique {
                tx.execute(
                    "INSERT INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
                    params![task_id, user_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_task_assignees(&self, task_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id",
            )?;
            let ids = stmt
                .query_map(params![task_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
    }
}
