//! Custom field routes.

use super::AppState;
use super::extract::{ApiJson, CurrentUser};
use super::tags::authorize_task;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::{CustomFieldDefinition, Role};
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CreateFieldRequest {
    pub name: String,
    pub field_type: String,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetValueRequest {
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct FieldEnabled {
    pub list_id: String,
    pub field_id: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct EnabledFields {
    pub list_id: String,
    pub field_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldValue {
    pub task_id: String,
    pub field_id: String,
    pub value: Value,
}

pub async fn create_field(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateFieldRequest>,
) -> ApiResult<Json<CustomFieldDefinition>> {
    state.db.require_role(user.id(), &workspace_id, Role::Admin)?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }
    let field = state
        .db
        .create_custom_field(&workspace_id, name, body.field_type.trim(), body.options)?;
    Ok(Json(field))
}

pub async fn list_fields(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<CustomFieldDefinition>>> {
    state.db.require_role(user.id(), &workspace_id, Role::Member)?;
    Ok(Json(state.db.list_custom_fields(&workspace_id)?))
}

pub async fn enabled_fields(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<EnabledFields>> {
    let workspace_id = state
        .db
        .workspace_of_list(&list_id)?
        .ok_or_else(|| ApiError::list_not_found(&list_id))?;
    state.db.require_role(user.id(), &workspace_id, Role::Member)?;
    let field_ids = state.db.list_enabled_fields(&list_id)?;
    Ok(Json(EnabledFields { list_id, field_ids }))
}

pub async fn enable_field(
    State(state): State<AppState>,
    Path((list_id, field_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<FieldEnabled>> {
    let workspace_id = state
        .db
        .workspace_of_list(&list_id)?
        .ok_or_else(|| ApiError::list_not_found(&list_id))?;
    state.db.require_role(user.id(), &workspace_id, Role::Member)?;

    let field = state
        .db
        .get_custom_field(&field_id)?
        .ok_or_else(|| ApiError::field_not_found(&field_id))?;
    if field.workspace_id != workspace_id {
        return Err(ApiError::new(
            ErrorCode::WorkspaceMismatch,
            "Field workspace mismatch with list",
        ));
    }

    state.db.enable_field_on_list(&list_id, &field_id)?;
    Ok(Json(FieldEnabled {
        list_id,
        field_id,
        enabled: true,
    }))
}

pub async fn set_value(
    State(state): State<AppState>,
    Path((task_id, field_id)): Path<(String, String)>,
    user: CurrentUser,
    ApiJson(body): ApiJson<SetValueRequest>,
) -> ApiResult<Json<FieldValue>> {
    authorize_task(&state, &user, &task_id, Role::Member)?;
    state
        .db
        .set_custom_field_value(&task_id, &field_id, body.value.clone())?;
    Ok(Json(FieldValue {
        task_id,
        field_id,
        value: body.value,
    }))
}

pub async fn get_value(
    State(state): State<AppState>,
    Path((task_id, field_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<FieldValue>> {
    authorize_task(&state, &user, &task_id, Role::Guest)?;
    let value = state
        .db
        .get_custom_field_value(&task_id, &field_id)?
        .unwrap_or(Value::Null);
    Ok(Json(FieldValue {
        task_id,
        field_id,
        value,
    }))
}
