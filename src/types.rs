//! Core entity types for taskhub.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Workspace role, ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Guest,
    Member,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "Guest",
            Role::Member => "Member",
            Role::Admin => "Admin",
            Role::Owner => "Owner",
        }
    }

    /// Normalize a stored role string. Matching is case-insensitive and
    /// ignores surrounding whitespace; anything else is treated as no role.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "guest" => Some(Role::Guest),
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub space_id: String,
    pub name: String,
}

/// A list of tasks. Always bound to a space; the folder is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub space_id: String,
    pub folder_id: Option<String>,
    pub name: String,
}

/// A task row. Status and priority are free-form strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub list_id: String,
    pub parent_task_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// RFC 3339 UTC timestamp.
    pub due_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub list_id: String,
    pub name: String,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Explicit creation time in millis; defaults to now.
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl NewTask {
    pub fn new(list_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn parent(mut self, parent_task_id: impl Into<String>) -> Self {
        self.parent_task_id = Some(parent_task_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    /// Free-form label such as "Text" or "Dropdown".
    pub field_type: String,
    pub options: Option<Value>,
}

/// Scope a saved view is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewScopeType {
    Workspace,
    Space,
    List,
}

impl ViewScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewScopeType::Workspace => "workspace",
            ViewScopeType::Space => "space",
            ViewScopeType::List => "list",
        }
    }
}

impl FromStr for ViewScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "workspace" => Ok(ViewScopeType::Workspace),
            "space" => Ok(ViewScopeType::Space),
            "list" => Ok(ViewScopeType::List),
            other => Err(format!("unknown view scope type: {}", other)),
        }
    }
}

/// A saved view as stored. `scope_type` stays a raw string so that rows
/// written by older clients still load; it is checked when a view is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    pub id: String,
    pub owner_id: String,
    pub scope_type: String,
    pub scope_id: String,
    pub name: String,
    pub filters_json: Option<Value>,
    pub sort_spec: Option<String>,
    pub columns_json: Option<Vec<String>>,
    pub is_default: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewView {
    pub name: String,
    pub scope_type: ViewScopeType,
    pub scope_id: String,
    #[serde(default)]
    pub filters_json: Option<Value>,
    #[serde(default)]
    pub sort_spec: Option<String>,
    #[serde(default)]
    pub columns_json: Option<Vec<String>>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub filters_json: Option<Value>,
    #[serde(default)]
    pub sort_spec: Option<String>,
    #[serde(default)]
    pub columns_json: Option<Vec<String>>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// Maximum length of a saved view name.
pub const VIEW_NAME_MAX_LEN: usize = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("owner"), Some(Role::Owner));
        assert_eq!(Role::parse("  ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("Member"), Some(Role::Member));
        assert_eq!(Role::parse("guest"), Some(Role::Guest));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_ordering_follows_rank() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }

    #[test]
    fn view_scope_type_from_str() {
        assert_eq!("List".parse::<ViewScopeType>(), Ok(ViewScopeType::List));
        assert_eq!("space".parse::<ViewScopeType>(), Ok(ViewScopeType::Space));
        assert!("folder".parse::<ViewScopeType>().is_err());
    }
}
