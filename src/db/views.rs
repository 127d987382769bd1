//! Saved views: owner-only CRUD and applying a list-scoped view to tasks.
//!
//! A view that does not exist and a view owned by someone else produce the
//! same not-found error.

use super::{Database, new_id, now_ms, optional};
use crate::error::ApiError;
use crate::query::sort::{TieBreak, order_by_sql, parse_view_sort};
use crate::types::{NewView, SavedView, VIEW_NAME_MAX_LEN, ViewScopeType, ViewUpdate};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 200;

const VIEW_COLUMNS: &str = "id, owner_id, scope_type, scope_id, name, filters_json, \
     sort_spec, columns_json, is_default, created_at";

/// One task in a view page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewItem {
    pub id: String,
    pub name: String,
}

/// A page of tasks produced by applying a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPage {
    pub total: i64,
    pub pages: i64,
    pub items: Vec<ViewItem>,
}

impl ViewPage {
    fn empty() -> Self {
        Self {
            total: 0,
            pages: 0,
            items: Vec::new(),
        }
    }
}

fn parse_view_row(row: &Row) -> rusqlite::Result<SavedView> {
    let filters: Option<String> = row.get("filters_json")?;
    let columns: Option<String> = row.get("columns_json")?;
    Ok(SavedView {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        scope_type: row.get("scope_type")?,
        scope_id: row.get("scope_id")?,
        name: row.get("name")?,
        filters_json: filters.and_then(|s| serde_json::from_str(&s).ok()),
        sort_spec: row.get("sort_spec")?,
        columns_json: columns.and_then(|s| serde_json::from_str(&s).ok()),
        is_default: row.get::<_, i64>("is_default")? != 0,
        created_at: row.get("created_at")?,
    })
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let len = name.trim().chars().count();
    if len == 0 || name.chars().count() > VIEW_NAME_MAX_LEN {
        return Err(ApiError::validation(
            "name",
            format!("name must be 1 to {} characters", VIEW_NAME_MAX_LEN),
        ));
    }
    Ok(())
}

fn to_json_text<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Into::into)
}

fn get_owned_view_internal(conn: &Connection, view_id: &str, owner_id: &str) -> Result<SavedView> {
    let sql = format!("SELECT {} FROM views WHERE id = ?1", VIEW_COLUMNS);
    let view = optional(conn.query_row(&sql, params![view_id], parse_view_row))?;
    match view {
        Some(v) if v.owner_id == owner_id => Ok(v),
        _ => Err(ApiError::view_not_found().into()),
    }
}

impl Database {
    pub fn create_view(&self, owner_id: &str, input: NewView) -> Result<SavedView, ApiError> {
        validate_name(&input.name)?;
        let view = SavedView {
            id: new_id(),
            owner_id: owner_id.to_string(),
            scope_type: input.scope_type.as_str().to_string(),
            scope_id: input.scope_id,
            name: input.name,
            filters_json: input.filters_json,
            sort_spec: input.sort_spec,
            columns_json: input.columns_json,
            is_default: input.is_default,
            created_at: now_ms(),
        };
        let filters = to_json_text(view.filters_json.as_ref())?;
        let columns = to_json_text(view.columns_json.as_ref())?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO views (id, owner_id, scope_type, scope_id, name, filters_json,
                                    sort_spec, columns_json, is_default, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    view.id,
                    view.owner_id,
                    view.scope_type,
                    view.scope_id,
                    view.name,
                    filters,
                    view.sort_spec,
                    columns,
                    view.is_default,
                    view.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(view)
    }

    /// The caller's views, optionally narrowed by scope; defaults first, then
    /// newest first.
    pub fn list_views(
        &self,
        owner_id: &str,
        scope_type: Option<ViewScopeType>,
        scope_id: Option<&str>,
    ) -> Result<Vec<SavedView>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM views WHERE owner_id = ?", VIEW_COLUMNS);
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id.to_string())];
            if let Some(scope_type) = scope_type {
                sql.push_str(" AND scope_type = ?");
                params_vec.push(Box::new(scope_type.as_str()));
            }
            if let Some(scope_id) = scope_id {
                sql.push_str(" AND scope_id = ?");
                params_vec.push(Box::new(scope_id.to_string()));
            }
            sql.push_str(" ORDER BY is_default DESC, created_at DESC, id");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let views = stmt
                .query_map(params_refs.as_slice(), parse_view_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(views)
        })
    }

    pub fn get_owned_view(&self, view_id: &str, owner_id: &str) -> Result<SavedView, ApiError> {
        Ok(self.with_conn(|conn| get_owned_view_internal(conn, view_id, owner_id))?)
    }

    /// Apply the fields present in `update`.
    pub fn update_view(
        &self,
        view_id: &str,
        owner_id: &str,
        update: ViewUpdate,
    ) -> Result<SavedView, ApiError> {
        if let Some(ref name) = update.name {
            validate_name(name)?;
        }
        Ok(self.with_conn(|conn| {
            let mut view = get_owned_view_internal(conn, view_id, owner_id)?;
            if let Some(name) = update.name {
                view.name = name;
            }
            if let Some(filters) = update.filters_json {
                view.filters_json = Some(filters);
            }
            if let Some(sort_spec) = update.sort_spec {
                view.sort_spec = Some(sort_spec);
            }
            if let Some(columns) = update.columns_json {
                view.columns_json = Some(columns);
            }
            if let Some(is_default) = update.is_default {
                view.is_default = is_default;
            }
            conn.execute(
                "UPDATE views SET name = ?1, filters_json = ?2, sort_spec = ?3,
                                  columns_json = ?4, is_default = ?5
                 WHERE id = ?6",
                params![
                    view.name,
                    to_json_text::<Value>(view.filters_json.as_ref())?,
                    view.sort_spec,
                    to_json_text(view.columns_json.as_ref())?,
                    view.is_default,
                    view.id,
                ],
            )?;
            Ok(view)
        })?)
    }

    pub fn delete_view(&self, view_id: &str, owner_id: &str) -> Result<(), ApiError> {
        Ok(self.with_conn(|conn| {
            get_owned_view_internal(conn, view_id, owner_id)?;
            conn.execute("DELETE FROM views WHERE id = ?1", params![view_id])?;
            Ok(())
        })?)
    }

    /// Apply a list-scoped view: one page of the list's tasks ordered by the
    /// view's sort spec (or `sort` when given), always tie-broken by id.
    pub fn apply_view(
        &self,
        view_id: &str,
        owner_id: &str,
        sort: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<ViewPage, ApiError> {
        if page < 1 {
            return Err(ApiError::validation("page", "page must be >= 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(ApiError::validation(
                "per_page",
                format!("per_page must be between 1 and {}", MAX_PER_PAGE),
            ));
        }
        // None when the page lies beyond any representable offset.
        let offset = page.checked_sub(1).and_then(|p| p.checked_mul(per_page));

        Ok(self.with_conn(|conn| {
            let view = get_owned_view_internal(conn, view_id, owner_id)?;
            if view.scope_type.parse::<ViewScopeType>().ok() != Some(ViewScopeType::List) {
                return Err(ApiError::view_not_list_scoped().into());
            }
            let list_id = view.scope_id.trim();
            if list_id.is_empty() {
                return Ok(ViewPage::empty());
            }

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks t WHERE t.list_id = ?1",
                params![list_id],
                |row| row.get(0),
            )?;
            if total == 0 {
                return Ok(ViewPage::empty());
            }
            let pages = (total + per_page - 1) / per_page;
            let Some(offset) = offset else {
                return Ok(ViewPage {
                    total,
                    pages,
                    items: Vec::new(),
                });
            };

            let keys = parse_view_sort(sort.filter(|s| !s.trim().is_empty()).or(view.sort_spec.as_deref()));
            let sql = format!(
                "SELECT t.id, t.name FROM tasks t WHERE t.list_id = ?1{} LIMIT ?2 OFFSET ?3",
                order_by_sql(&keys, TieBreak::IdAscending)
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params![list_id, per_page, offset], |row| {
                    Ok(ViewItem {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(ViewPage {
                total,
                pages,
                items,
            })
        })?)
    }
}
