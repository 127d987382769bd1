//! Saved view routes. Every route is owner-only.

use super::AppState;
use super::extract::{ApiJson, ApiQuery, CurrentUser};
use crate::db::views::{DEFAULT_PER_PAGE, ViewPage};
use crate::error::{ApiError, ApiResult};
use crate::types::{NewView, SavedView, ViewScopeType, ViewUpdate};
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListViewsParams {
    pub scope_type: Option<String>,
    pub scope_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub detail: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyViewParams {
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_views(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListViewsParams>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<SavedView>>> {
    let scope_type = match params.scope_type.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(
            raw.parse::<ViewScopeType>()
                .map_err(|e| ApiError::validation("scope_type", e))?,
        ),
        None => None,
    };
    let views = state
        .db
        .list_views(user.id(), scope_type, params.scope_id.as_deref())?;
    Ok(Json(views))
}

pub async fn create_view(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<NewView>,
) -> ApiResult<Json<SavedView>> {
    Ok(Json(state.db.create_view(user.id(), body)?))
}

pub async fn get_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<SavedView>> {
    Ok(Json(state.db.get_owned_view(&view_id, user.id())?))
}

pub async fn update_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    user: CurrentUser,
    ApiJson(body): ApiJson<ViewUpdate>,
) -> ApiResult<Json<SavedView>> {
    Ok(Json(state.db.update_view(&view_id, user.id(), body)?))
}

pub async fn delete_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Deleted>> {
    state.db.delete_view(&view_id, user.id())?;
    Ok(Json(Deleted {
        detail: "View deleted",
    }))
}

pub async fn apply_view(
    State(state): State<AppState>,
    Path(view_id): Path<String>,
    ApiQuery(params): ApiQuery<ApplyViewParams>,
    user: CurrentUser,
) -> ApiResult<Json<ViewPage>> {
    let page = state.db.apply_view(
        &view_id,
        user.id(),
        params.sort.as_deref(),
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    )?;
    Ok(Json(page))
}
