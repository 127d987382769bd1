//! Output records and the response envelope.

use crate::types::Task;
use serde::{Deserialize, Serialize};

/// Minimal task record returned by the filter endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOut {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub list_id: String,
}

impl From<&Task> for TaskOut {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            status: task.status.clone(),
            priority: task.priority.clone(),
            due_date: task.due_date.clone(),
            list_id: task.list_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Bucket label; `null` when no grouping was requested.
    pub group: Option<String>,
    pub tasks: Vec<TaskOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    /// Tasks on this page (sum of bucket sizes), not the total match count.
    pub count: usize,
    pub groups: Vec<Group>,
}

impl FilterResponse {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            count: groups.iter().map(|g| g.tasks.len()).sum(),
            groups,
        }
    }

    /// Task ids across all buckets, in bucket order.
    pub fn task_ids(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.tasks.iter().map(|t| t.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn out(id: &str) -> TaskOut {
        TaskOut {
            id: id.to_string(),
            name: id.to_uppercase(),
            status: Some("to_do".into()),
            priority: None,
            due_date: None,
            list_id: "l".into(),
        }
    }

    #[test]
    fn count_is_sum_of_bucket_sizes() {
        let response = FilterResponse::new(vec![
            Group {
                group: Some("a".into()),
                tasks: vec![out("1"), out("2")],
            },
            Group {
                group: Some("b".into()),
                tasks: vec![out("3")],
            },
        ]);
        assert_eq!(response.count, 3);
        assert_eq!(response.task_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn serializes_envelope() {
        let response = FilterResponse::new(vec![Group {
            group: None,
            tasks: vec![out("1")],
        }]);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "count": 1,
                "groups": [{
                    "group": null,
                    "tasks": [{
                        "id": "1",
                        "name": "1",
                        "status": "to_do",
                        "priority": null,
                        "due_date": null,
                        "list_id": "l"
                    }]
                }]
            })
        );
    }
}
