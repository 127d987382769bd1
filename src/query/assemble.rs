//! Query assembly: scope + predicates + tags + sort + pagination.

use super::payload::FilterPayload;
use super::predicate::compile_rules;
use super::scope::{SCOPE_FROM, resolve, scope_clause};
use super::sort::{SortKey, TieBreak, order_by_sql};
use super::tags::compile_tags;
use crate::db::tasks::TASK_COLUMNS;
use rusqlite::types::Value as SqlValue;

/// A ready-to-run task query.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Build the `SELECT DISTINCT` over tasks for a payload already bound to
/// `workspace_id` (see [`super::scope::bind_to_path`]).
pub fn build_task_query(
    payload: &FilterPayload,
    workspace_id: &str,
    sort: SortKey,
    tie_break: TieBreak,
) -> TaskQuery {
    let mut conditions = vec![scope_clause(resolve(&payload.scope), workspace_id)];
    conditions.extend(compile_rules(&payload.filters, workspace_id));
    if let Some(tags) = payload.tags.as_ref().and_then(|t| compile_tags(t, workspace_id)) {
        conditions.push(tags);
    }

    let mut sql = format!("SELECT DISTINCT {} {}", TASK_COLUMNS, SCOPE_FROM);
    let mut params = Vec::new();
    let where_sql: Vec<String> = conditions
        .into_iter()
        .map(|clause| {
            params.extend(clause.params);
            clause.sql
        })
        .collect();
    sql.push_str(" WHERE ");
    sql.push_str(&where_sql.join(" AND "));

    sql.push_str(&order_by_sql(&[sort], tie_break));

    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(SqlValue::Integer(payload.limit));
    params.push(SqlValue::Integer(payload.offset));

    TaskQuery { sql, params }
}
