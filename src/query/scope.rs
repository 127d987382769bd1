//! Scope resolution: which tasks a query may see before any filter applies.

use super::Clause;
use super::payload::Scope;
use crate::error::ApiError;
use rusqlite::types::Value as SqlValue;

/// Tables every task query reads from. Scope and predicates refer to the
/// aliases `t` (tasks), `l` (lists) and `s` (spaces).
pub const SCOPE_FROM: &str = "FROM tasks t \
     JOIN lists l ON l.id = t.list_id \
     JOIN spaces s ON s.id = l.space_id";

/// The locator that won precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedScope<'a> {
    List(&'a str),
    Folder(&'a str),
    Space(&'a str),
    Workspace,
}

/// Bind a payload scope to the trusted path workspace.
///
/// A payload `workspace_id` that disagrees with the path is rejected. When no
/// list, folder or space is given the path workspace is injected.
pub fn bind_to_path(scope: &mut Scope, path_workspace_id: &str) -> Result<(), ApiError> {
    if let Some(payload_ws) = scope.workspace_id() {
        if payload_ws != path_workspace_id {
            return Err(ApiError::scope_conflict(payload_ws, path_workspace_id));
        }
    }
    if !scope.has_narrow_locator() {
        scope.workspace_id = Some(path_workspace_id.to_string());
    }
    Ok(())
}

/// Pick the narrowest locator: list > folder > space > workspace.
pub fn resolve(scope: &Scope) -> ResolvedScope<'_> {
    if let Some(id) = scope.list_id() {
        ResolvedScope::List(id)
    } else if let Some(id) = scope.folder_id() {
        ResolvedScope::Folder(id)
    } else if let Some(id) = scope.space_id() {
        ResolvedScope::Space(id)
    } else {
        ResolvedScope::Workspace
    }
}

/// WHERE fragment for a resolved scope.
///
/// The workspace constraint is always present so that a list, folder or space
/// id from another workspace yields nothing.
pub fn scope_clause(resolved: ResolvedScope<'_>, workspace_id: &str) -> Clause {
    let mut sql = String::from("s.workspace_id = ?");
    let mut params = vec![SqlValue::Text(workspace_id.to_string())];
    match resolved {
        ResolvedScope::List(id) => {
            sql.push_str(" AND t.list_id = ?");
            params.push(SqlValue::Text(id.to_string()));
        }
        ResolvedScope::Folder(id) => {
            sql.push_str(" AND l.folder_id = ?");
            params.push(SqlValue::Text(id.to_string()));
        }
        ResolvedScope::Space(id) => {
            sql.push_str(" AND l.space_id = ?");
            params.push(SqlValue::Text(id.to_string()));
        }
        ResolvedScope::Workspace => {}
    }
    Clause::new(sql, params)
}
