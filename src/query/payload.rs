//! Wire types for the filter endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_LIMIT: i64 = 200;
pub const MAX_LIMIT: i64 = 1000;

/// Prefix that marks a custom field on the wire, e.g. `cf_<definition id>`.
pub const CUSTOM_FIELD_PREFIX: &str = "cf_";

/// Dataset boundary. At least one locator must be set; when several are set
/// the narrowest wins (list > folder > space > workspace).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub space_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

fn present(locator: &Option<String>) -> Option<&str> {
    locator.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Scope {
    pub fn workspace(id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn space(id: impl Into<String>) -> Self {
        Self {
            space_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn list(id: impl Into<String>) -> Self {
        Self {
            list_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn list_id(&self) -> Option<&str> {
        present(&self.list_id)
    }

    pub fn folder_id(&self) -> Option<&str> {
        present(&self.folder_id)
    }

    pub fn space_id(&self) -> Option<&str> {
        present(&self.space_id)
    }

    pub fn workspace_id(&self) -> Option<&str> {
        present(&self.workspace_id)
    }

    /// True when a list, folder or space locator is set.
    pub fn has_narrow_locator(&self) -> bool {
        self.list_id().is_some() || self.folder_id().is_some() || self.space_id().is_some()
    }

    pub fn has_locator(&self) -> bool {
        self.has_narrow_locator() || self.workspace_id().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Contains => "contains",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task attributes that map to a fixed column or link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeField {
    Name,
    Status,
    Priority,
    DueDate,
    AssigneeId,
}

impl NativeField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(NativeField::Name),
            "status" => Some(NativeField::Status),
            "priority" => Some(NativeField::Priority),
            "due_date" => Some(NativeField::DueDate),
            "assignee_id" => Some(NativeField::AssigneeId),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NativeField::Name => "name",
            NativeField::Status => "status",
            NativeField::Priority => "priority",
            NativeField::DueDate => "due_date",
            NativeField::AssigneeId => "assignee_id",
        }
    }

    /// Task column for scalar fields. Assignees live in a link table.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            NativeField::Name => Some("t.name"),
            NativeField::Status => Some("t.status"),
            NativeField::Priority => Some("t.priority"),
            NativeField::DueDate => Some("t.due_date"),
            NativeField::AssigneeId => None,
        }
    }
}

/// Target of a filter rule.
///
/// Unrecognised names are kept rather than rejected so that clients sending
/// fields this server does not know about still get a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterField {
    Native(NativeField),
    Custom(String),
    Unknown(String),
}

impl FilterField {
    pub fn parse(name: &str) -> Self {
        if let Some(field) = NativeField::parse(name) {
            return FilterField::Native(field);
        }
        match name.strip_prefix(CUSTOM_FIELD_PREFIX) {
            Some(id) if !id.trim().is_empty() => FilterField::Custom(id.trim().to_string()),
            _ => FilterField::Unknown(name.to_string()),
        }
    }

    pub fn custom(definition_id: impl Into<String>) -> Self {
        FilterField::Custom(definition_id.into())
    }

    /// The name as it appears on the wire.
    pub fn wire_name(&self) -> String {
        match self {
            FilterField::Native(field) => field.as_str().to_string(),
            FilterField::Custom(id) => format!("{}{}", CUSTOM_FIELD_PREFIX, id),
            FilterField::Unknown(name) => name.clone(),
        }
    }
}

impl From<String> for FilterField {
    fn from(name: String) -> Self {
        FilterField::parse(&name)
    }
}

impl From<FilterField> for String {
    fn from(field: FilterField) -> Self {
        field.wire_name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub field: FilterField,
    pub op: Operator,
    #[serde(default)]
    pub value: Option<Value>,
}

impl FilterRule {
    pub fn new(field: FilterField, op: Operator, value: Option<Value>) -> Self {
        Self { field, op, value }
    }

    pub fn native(field: NativeField, op: Operator, value: Value) -> Self {
        Self::new(FilterField::Native(field), op, Some(value))
    }

    pub fn custom(definition_id: &str, op: Operator, value: Value) -> Self {
        Self::new(FilterField::custom(definition_id), op, Some(value))
    }

    /// A rule without a value, for `is_empty` and `is_not_empty`.
    pub fn unary(field: FilterField, op: Operator) -> Self {
        Self::new(field, op, None)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagsMatch {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagsFilter {
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default, rename = "match")]
    pub match_mode: TagsMatch,
}

impl TagsFilter {
    pub fn any(tag_ids: Vec<String>) -> Self {
        Self {
            tag_ids,
            match_mode: TagsMatch::Any,
        }
    }

    pub fn all(tag_ids: Vec<String>) -> Self {
        Self {
            tag_ids,
            match_mode: TagsMatch::All,
        }
    }
}

/// Grouping key for the response buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroupBy {
    Status,
    Priority,
    DueDate,
    AssigneeId,
    TagIds,
    Custom(String),
}

impl GroupBy {
    pub fn wire_name(&self) -> String {
        match self {
            GroupBy::Status => "status".to_string(),
            GroupBy::Priority => "priority".to_string(),
            GroupBy::DueDate => "due_date".to_string(),
            GroupBy::AssigneeId => "assignee_id".to_string(),
            GroupBy::TagIds => "tag_ids".to_string(),
            GroupBy::Custom(id) => format!("{}{}", CUSTOM_FIELD_PREFIX, id),
        }
    }
}

impl TryFrom<String> for GroupBy {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        match name.as_str() {
            "status" => Ok(GroupBy::Status),
            "priority" => Ok(GroupBy::Priority),
            "due_date" => Ok(GroupBy::DueDate),
            "assignee_id" => Ok(GroupBy::AssigneeId),
            "tag_ids" => Ok(GroupBy::TagIds),
            other => match other.strip_prefix(CUSTOM_FIELD_PREFIX) {
                Some(id) if !id.trim().is_empty() => Ok(GroupBy::Custom(id.trim().to_string())),
                _ => Err(format!("unsupported group_by: {}", other)),
            },
        }
    }
}

impl From<GroupBy> for String {
    fn from(group: GroupBy) -> Self {
        group.wire_name()
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Body of `POST /workspaces/{workspace_id}/tasks/filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPayload {
    pub scope: Scope,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    #[serde(default)]
    pub tags: Option<TagsFilter>,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl FilterPayload {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            filters: Vec::new(),
            tags: None,
            group_by: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn filter(mut self, rule: FilterRule) -> Self {
        self.filters.push(rule);
        self
    }

    pub fn tags(mut self, tags: TagsFilter) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Check the bounds the wire schema cannot express.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if !self.scope.has_locator() {
            return Err(PayloadError::MissingScope);
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(PayloadError::LimitOutOfRange(self.limit));
        }
        if self.offset < 0 {
            return Err(PayloadError::NegativeOffset(self.offset));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Provide one scope: workspace_id or space_id or folder_id or list_id")]
    MissingScope,
    #[error("limit must be between 1 and 1000, got {0}")]
    LimitOutOfRange(i64),
    #[error("offset must be >= 0, got {0}")]
    NegativeOffset(i64),
}

impl PayloadError {
    /// Payload path of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            PayloadError::MissingScope => "scope",
            PayloadError::LimitOutOfRange(_) => "limit",
            PayloadError::NegativeOffset(_) => "offset",
        }
    }
}
