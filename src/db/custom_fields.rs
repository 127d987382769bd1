//! Custom field definitions, list enablement and per-task values.
//!
//! Values are stored as a JSON envelope `{"value": <any>}` so that the filter
//! engine can read them back with `json_extract(value, '$.value')`.

use super::hierarchy::workspace_of_task_internal;
use super::{Database, new_id, optional};
use crate::error::ApiError;
use crate::types::CustomFieldDefinition;
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use serde_json::{Value, json};

fn parse_definition_row(row: &Row) -> rusqlite::Result<CustomFieldDefinition> {
    let options: Option<String> = row.get("options")?;
    Ok(CustomFieldDefinition {
        id: row.get("id")?,
        workspace_id: row.get("workspace_id")?,
        name: row.get("name")?,
        field_type: row.get("field_type")?,
        options: options.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn get_custom_field_internal(conn: &Connection, field_id: &str) -> Result<Option<CustomFieldDefinition>> {
    optional(conn.query_row(
        "SELECT id, workspace_id, name, field_type, options
         FROM custom_field_definitions WHERE id = ?1",
        params![field_id],
        parse_definition_row,
    ))
}

impl Database {
    /// Define a custom field. Names are unique within a workspace.
    pub fn create_custom_field(
        &self,
        workspace_id: &str,
        name: &str,
        field_type: &str,
        options: Option<Value>,
    ) -> Result<CustomFieldDefinition, ApiError> {
        let definition = CustomFieldDefinition {
            id: new_id(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            field_type: field_type.to_string(),
            options,
        };
        let options_json = definition.options.as_ref().map(Value::to_string);

        self.with_conn(|conn| {
            let existing: Option<String> = optional(conn.query_row(
                "SELECT id FROM custom_field_definitions WHERE workspace_id = ?1 AND name = ?2",
                params![workspace_id, name],
                |row| row.get(0),
            ))?;
            if existing.is_some() {
                return Err(ApiError::already_exists(format!(
                    "Custom field '{}' already exists in this workspace",
                    name
                ))
                .into());
            }
            conn.execute(
                "INSERT INTO custom_field_definitions (id, workspace_id, name, field_type, options)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    definition.id,
                    definition.workspace_id,
                    definition.name,
                    definition.field_type,
                    options_json,
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(field_id = %definition.id, workspace_id, "created custom field");
        Ok(definition)
    }

    pub fn list_custom_fields(&self, workspace_id: &str) -> Result<Vec<CustomFieldDefinition>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, workspace_id, name, field_type, options
                 FROM custom_field_definitions WHERE workspace_id = ?1 ORDER BY name, id",
            )?;
            let fields = stmt
                .query_map(params![workspace_id], parse_definition_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(fields)
        })
    }

    pub fn get_custom_field(&self, field_id: &str) -> Result<Option<CustomFieldDefinition>> {
        self.with_conn(|conn| get_custom_field_internal(conn, field_id))
    }

    /// Enable a field on a list. Enabling twice is a no-op.
    pub fn enable_field_on_list(&self, list_id: &str, field_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO list_custom_fields (list_id, field_definition_id)
                 VALUES (?1, ?2)",
                params![list_id, field_id],
            )?;
            Ok(())
        })
    }

    /// Field ids enabled on a list.
    pub fn list_enabled_fields(&self, list_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT field_definition_id FROM list_custom_fields
                 WHERE list_id = ?1 ORDER BY field_definition_id",
            )?;
            let ids = stmt
                .query_map(params![list_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
    }

    /// Set (insert or replace) a task's value for a field.
    ///
    /// The field must be defined in the task's workspace. Enablement on the
    /// task's list is not required.
    pub fn set_custom_field_value(&self, task_id: &str, field_id: &str, value: Value) -> Result<(), ApiError> {
        self.with_conn(|conn| {
            let task_ws = workspace_of_task_internal(conn, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;
            let field = get_custom_field_internal(conn, field_id)?
                .ok_or_else(|| ApiError::field_not_found(field_id))?;
            if field.workspace_id != task_ws {
                return Err(ApiError::workspace_mismatch("Field").into());
            }
            let envelope = json!({ "value": value }).to_string();
            conn.execute(
                "INSERT INTO custom_field_values (task_id, field_definition_id, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(task_id, field_definition_id) DO UPDATE SET value = excluded.value",
                params![task_id, field_id, envelope],
            )?;
            Ok(())
        })
        .map_err(ApiError::from)
    }

    /// The unwrapped value, or `None` when no value row exists.
    pub fn get_custom_field_value(&self, task_id: &str, field_id: &str) -> Result<Option<Value>> {
        self.with_conn(|conn| {
            let stored: Option<Option<String>> = optional(conn.query_row(
                "SELECT value FROM custom_field_values
                 WHERE task_id = ?1 AND field_definition_id = ?2",
                params![task_id, field_id],
                |row| row.get(0),
            ))?;
            Ok(stored.map(|raw| {
                raw.and_then(|s| serde_json::from_str::<Value>(&s).ok())
                    .and_then(|mut envelope| envelope.get_mut("value").map(Value::take))
                    .unwrap_or(Value::Null)
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::NewTask;

    struct Fixture {
        db: Database,
        ws: String,
        other_ws: String,
        list: String,
        task: String,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("owner@example.com", None).unwrap();
        let ws = db.create_workspace("WS", &owner.id).unwrap();
        let other = db.create_workspace("Other", &owner.id).unwrap();
        let space = db.create_space(&ws.id, "S").unwrap();
        let list = db.create_list(&space.id, None, "L").unwrap();
        let task = db.create_task(NewTask::new(&list.id, "T")).unwrap();
        Fixture {
            db,
            ws: ws.id,
            other_ws: other.id,
            list: list.id,
            task: task.id,
        }
    }

    #[test]
    fn duplicate_name_in_workspace_conflicts() {
        let f = setup();
        f.db.create_custom_field(&f.ws, "Team", "Text", None).unwrap();

        let err = f
            .db
            .create_custom_field(&f.ws, "Team", "Text", None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);

        // Same name in another workspace is fine.
        f.db.create_custom_field(&f.other_ws, "Team", "Text", None)
            .unwrap();
    }

    #[test]
    fn options_round_trip() {
        let f = setup();
        let options = json!({"choices": ["a", "b"]});
        let field = f
            .db
            .create_custom_field(&f.ws, "Choice", "Dropdown", Some(options.clone()))
            .unwrap();

        let fetched = f.db.get_custom_field(&field.id).unwrap().unwrap();
        assert_eq!(fetched.options, Some(options));
        assert_eq!(f.db.list_custom_fields(&f.ws).unwrap(), vec![fetched]);
    }

    #[test]
    fn enable_is_idempotent() {
        let f = setup();
        let field = f.db.create_custom_field(&f.ws, "Team", "Text", None).unwrap();

        f.db.enable_field_on_list(&f.list, &field.id).unwrap();
        f.db.enable_field_on_list(&f.list, &field.id).unwrap();
        assert_eq!(f.db.list_enabled_fields(&f.list).unwrap(), vec![field.id]);
    }

    #[test]
    fn set_then_get_value() {
        let f = setup();
        let field = f.db.create_custom_field(&f.ws, "Team", "Text", None).unwrap();

        assert_eq!(f.db.get_custom_field_value(&f.task, &field.id).unwrap(), None);

        f.db.set_custom_field_value(&f.task, &field.id, json!("Alpha"))
            .unwrap();
        assert_eq!(
            f.db.get_custom_field_value(&f.task, &field.id).unwrap(),
            Some(json!("Alpha"))
        );

        f.db.set_custom_field_value(&f.task, &field.id, json!(42))
            .unwrap();
        assert_eq!(
            f.db.get_custom_field_value(&f.task, &field.id).unwrap(),
            Some(json!(42))
        );

        f.db.set_custom_field_value(&f.task, &field.id, Value::Null)
            .unwrap();
        assert_eq!(
            f.db.get_custom_field_value(&f.task, &field.id).unwrap(),
            Some(Value::Null)
        );
    }

    #[test]
    fn set_value_rejects_foreign_field() {
        let f = setup();
        let foreign = f
            .db
            .create_custom_field(&f.other_ws, "Team", "Text", None)
            .unwrap();

        let err = f
            .db
            .set_custom_field_value(&f.task, &foreign.id, json!("x"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkspaceMismatch);
        assert_eq!(
            f.db.set_custom_field_value(&f.task, "missing", json!("x"))
                .unwrap_err()
                .code,
            ErrorCode::FieldNotFound
        );
    }
}
