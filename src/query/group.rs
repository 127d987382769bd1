//! Post-query grouping of the fetched page into labelled buckets.

use super::payload::GroupBy;
use super::shape::{Group, TaskOut};
use crate::types::Task;
use anyhow::Result;
use std::collections::HashMap;

/// Label for tasks whose grouping value is missing, null or empty.
pub const NO_VALUE: &str = "No Value";
/// Single bucket for every task with at least one assignee.
pub const ASSIGNEE_BUCKET: &str = "Assignee";
/// Single bucket used when grouping by tags.
pub const TAGS_BUCKET: &str = "Tags";

/// Per-task lookups the grouping stage needs beyond the task row.
pub trait FieldValueLookup {
    /// A custom field value as text, `None` when the task has no value row
    /// or the stored value is null.
    fn custom_value(&self, task_id: &str, field_id: &str) -> Result<Option<String>>;

    fn has_assignee(&self, task_id: &str) -> Result<bool>;
}

fn label(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NO_VALUE.to_string(),
    }
}

/// Bucket tasks by `group_by`, keeping first-seen bucket order and the
/// fetched order within each bucket.
pub fn group_tasks(
    tasks: &[Task],
    group_by: Option<&GroupBy>,
    lookup: &dyn FieldValueLookup,
) -> Result<Vec<Group>> {
    let Some(group_by) = group_by else {
        return Ok(vec![Group {
            group: None,
            tasks: tasks.iter().map(TaskOut::from).collect(),
        }]);
    };

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for task in tasks {
        let key = match group_by {
            GroupBy::Status => label(task.status.as_deref()),
            GroupBy::Priority => label(task.priority.as_deref()),
            GroupBy::DueDate => label(task.due_date.as_deref()),
            GroupBy::AssigneeId => {
                if lookup.has_assignee(&task.id)? {
                    ASSIGNEE_BUCKET.to_string()
                } else {
                    NO_VALUE.to_string()
                }
            }
            GroupBy::TagIds => TAGS_BUCKET.to_string(),
            GroupBy::Custom(field_id) => {
                label(lookup.custom_value(&task.id, field_id)?.as_deref())
            }
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                group: Some(key),
                tasks: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].tasks.push(TaskOut::from(task));
    }

    Ok(groups)
}
