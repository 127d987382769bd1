//! `POST /workspaces/{workspace_id}/tasks/filter`

use super::AppState;
use super::extract::{ApiJson, ApiQuery, CurrentUser};
use crate::error::ApiResult;
use crate::query::scope::bind_to_path;
use crate::query::sort::filter_sort;
use crate::query::{FilterPayload, FilterResponse};
use crate::types::Role;
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FilterSortParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Membership is checked before the scope so that a caller cannot learn
/// anything about a workspace they do not belong to. Nothing touches task
/// data until both checks pass.
pub async fn filter_tasks(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    ApiQuery(params): ApiQuery<FilterSortParams>,
    user: CurrentUser,
    ApiJson(mut payload): ApiJson<FilterPayload>,
) -> ApiResult<Json<FilterResponse>> {
    payload.validate()?;
    state.db.require_role(user.id(), &workspace_id, Role::Member)?;
    bind_to_path(&mut payload.scope, &workspace_id)?;

    let sort = filter_sort(params.sort.as_deref(), params.order.as_deref());
    let response = state.db.filter_tasks(&workspace_id, &payload, sort)?;
    Ok(Json(response))
}
