//! Tags block compilation (ANY / ALL membership).

use super::payload::{TagsFilter, TagsMatch};
use super::{Clause, placeholders};
use rusqlite::types::Value as SqlValue;
use std::collections::BTreeSet;

/// Compile the tags block, or `None` when it names no tags.
///
/// Only tags of the scope workspace are considered, so ids from another
/// workspace never match under ANY and make ALL unsatisfiable.
pub fn compile_tags(filter: &TagsFilter, workspace_id: &str) -> Option<Clause> {
    let tag_ids: BTreeSet<&str> = filter
        .tag_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();
    if tag_ids.is_empty() {
        return None;
    }

    let mut params = vec![SqlValue::Text(workspace_id.to_string())];
    params.extend(tag_ids.iter().map(|id| SqlValue::Text(id.to_string())));

    let mut sql = format!(
        "t.id IN (SELECT tt.task_id FROM task_tags tt \
         JOIN tags g ON g.id = tt.tag_id \
         WHERE g.workspace_id = ? AND tt.tag_id IN ({})",
        placeholders(tag_ids.len())
    );
    if filter.match_mode == TagsMatch::All {
        // Distinct ids, not rows: every requested tag must be present.
        sql.push_str(" GROUP BY tt.task_id HAVING COUNT(DISTINCT tt.tag_id) = ?");
        params.push(SqlValue::Integer(tag_ids.len() as i64));
    }
    sql.push(')');

    Some(Clause::new(sql, params))
}
