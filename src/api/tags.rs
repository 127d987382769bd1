//! Tag routes.

use super::AppState;
use super::extract::{ApiJson, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::types::{Role, Tag};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

pub async fn create_tag(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateTagRequest>,
) -> ApiResult<Json<Tag>> {
    state.db.require_role(user.id(), &workspace_id, Role::Member)?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }
    let tag = state
        .db
        .create_tag(&workspace_id, name, body.color.as_deref())?;
    Ok(Json(tag))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Tag>>> {
    state.db.require_any_role(user.id(), &workspace_id)?;
    Ok(Json(state.db.list_workspace_tags(&workspace_id)?))
}

/// Resolve the task's workspace and check the caller's role there.
pub(super) fn authorize_task(
    state: &AppState,
    user: &CurrentUser,
    task_id: &str,
    minimum: Role,
) -> ApiResult<String> {
    let workspace_id = state
        .db
        .workspace_of_task(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    state.db.require_role(user.id(), &workspace_id, minimum)?;
    Ok(workspace_id)
}

pub async fn task_tags(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Tag>>> {
    authorize_task(&state, &user, &task_id, Role::Guest)?;
    Ok(Json(state.db.get_tags_for_task(&task_id)?))
}

pub async fn assign_tag(
    State(state): State<AppState>,
    Path((task_id, tag_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Tag>>> {
    authorize_task(&state, &user, &task_id, Role::Member)?;
    state.db.assign_tag(&task_id, &tag_id)?;
    Ok(Json(state.db.get_tags_for_task(&task_id)?))
}

pub async fn unassign_tag(
    State(state): State<AppState>,
    Path((task_id, tag_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<StatusCode> {
    authorize_task(&state, &user, &task_id, Role::Member)?;
    state.db.unassign_tag(&task_id, &tag_id)?;
    Ok(StatusCode::NO_CONTENT)
}
