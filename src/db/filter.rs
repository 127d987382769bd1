//! Running the task query engine against the database.

use super::tasks::parse_task_row;
use super::{Database, optional};
use crate::query::assemble::TaskQuery;
use crate::query::payload::FilterPayload;
use crate::query::sort::{SortKey, TieBreak};
use crate::query::{FieldValueLookup, FilterResponse, build_task_query, group_tasks};
use crate::types::Task;
use anyhow::Result;
use rusqlite::{Connection, params, params_from_iter};

/// Point lookups served from a borrowed connection, so grouping runs inside
/// the same `with_conn` as the main query.
pub(crate) struct ConnLookup<'a> {
    conn: &'a Connection,
}

impl<'a> ConnLookup<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl FieldValueLookup for ConnLookup<'_> {
    fn custom_value(&self, task_id: &str, field_id: &str) -> Result<Option<String>> {
        let value: Option<Option<String>> = optional(self.conn.query_row(
            "SELECT CAST(json_extract(value, '$.value') AS TEXT) FROM custom_field_values
             WHERE task_id = ?1 AND field_definition_id = ?2",
            params![task_id, field_id],
            |row| row.get(0),
        ))?;
        Ok(value.flatten())
    }

    fn has_assignee(&self, task_id: &str) -> Result<bool> {
        let found: Option<i64> = optional(self.conn.query_row(
            "SELECT 1 FROM task_assignees WHERE task_id = ?1 LIMIT 1",
            params![task_id],
            |row| row.get(0),
        ))?;
        Ok(found.is_some())
    }
}

pub(crate) fn run_task_query(conn: &Connection, query: &TaskQuery) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let tasks = stmt
        .query_map(params_from_iter(query.params.iter()), parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

impl Database {
    /// Filter, paginate and group tasks for the filter endpoint.
    ///
    /// Ties in the sort column fall in storage order.
    pub fn filter_tasks(
        &self,
        workspace_id: &str,
        payload: &FilterPayload,
        sort: SortKey,
    ) -> Result<FilterResponse> {
        let query = build_task_query(payload, workspace_id, sort, TieBreak::None);
        tracing::debug!(sql = %query.sql, params = query.params.len(), "running task filter");

        self.with_conn(|conn| {
            let tasks = run_task_query(conn, &query)?;
            let groups = group_tasks(&tasks, payload.group_by.as_ref(), &ConnLookup::new(conn))?;
            Ok(FilterResponse::new(groups))
        })
    }
}
