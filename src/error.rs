//! Structured error types for API responses.

use crate::query::PayloadError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors
    ValidationFailed,
    ScopeConflict,
    WorkspaceMismatch,
    ViewNotListScoped,

    // Identity and access
    Unauthenticated,
    Forbidden,

    // Not found errors
    NotFound,
    TaskNotFound,
    TagNotFound,
    ListNotFound,
    FieldNotFound,
    ViewNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ScopeConflict
            | ErrorCode::WorkspaceMismatch
            | ErrorCode::ViewNotListScoped => StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound
            | ErrorCode::TaskNotFound
            | ErrorCode::TagNotFound
            | ErrorCode::ListNotFound
            | ErrorCode::FieldNotFound
            | ErrorCode::ViewNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error returned by handlers and the authorization gate.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    // Convenience constructors

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, reason).with_field(field)
    }

    pub fn scope_conflict(payload_workspace: &str, path_workspace: &str) -> Self {
        Self::new(
            ErrorCode::ScopeConflict,
            "Payload scope.workspace_id must match path workspace_id",
        )
        .with_field("scope.workspace_id")
        .with_details(format!(
            "payload={} path={}",
            payload_workspace, path_workspace
        ))
    }

    pub fn workspace_mismatch(what: &str) -> Self {
        Self::new(
            ErrorCode::WorkspaceMismatch,
            format!("{} workspace mismatch with task", what),
        )
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", what))
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn tag_not_found(tag_id: &str) -> Self {
        Self::new(ErrorCode::TagNotFound, format!("Tag not found: {}", tag_id))
    }

    pub fn list_not_found(list_id: &str) -> Self {
        Self::new(
            ErrorCode::ListNotFound,
            format!("List not found: {}", list_id),
        )
    }

    pub fn field_not_found(field_id: &str) -> Self {
        Self::new(
            ErrorCode::FieldNotFound,
            format!("Custom field not found: {}", field_id),
        )
    }

    /// Missing and not-owned views share this response so callers cannot
    /// discover the existence of other users' views.
    pub fn view_not_found() -> Self {
        Self::new(ErrorCode::ViewNotFound, "View not found")
    }

    pub fn view_not_list_scoped() -> Self {
        Self::new(
            ErrorCode::ViewNotListScoped,
            "Only list-scoped views can be applied to tasks",
        )
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, what)
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to ApiError first
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => ApiError::database(sql_err),
                Err(err) => ApiError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::database(err)
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        ApiError::validation(err.field(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "request rejected");
        }
        (status, Json(self)).into_response()
    }
}

/// Result type for handler operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
