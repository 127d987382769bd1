//! Workspace tags and task tagging.

use super::hierarchy::workspace_of_task_internal;
use super::{Database, new_id, optional};
use crate::error::ApiError;
use crate::types::Tag;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        workspace_id: row.get("workspace_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

fn get_tag_internal(conn: &Connection, tag_id: &str) -> Result<Option<Tag>> {
    optional(conn.query_row(
        "SELECT id, workspace_id, name, color FROM tags WHERE id = ?1",
        params![tag_id],
        parse_tag_row,
    ))
}

impl Database {
    pub fn create_tag(&self, workspace_id: &str, name: &str, color: Option<&str>) -> Result<Tag> {
        let tag = Tag {
            id: new_id(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (id, workspace_id, name, color) VALUES (?1, ?2, ?3, ?4)",
                params![tag.id, tag.workspace_id, tag.name, tag.color],
            )?;
            Ok(())
        })?;
        Ok(tag)
    }

    pub fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>> {
        self.with_conn(|conn| get_tag_internal(conn, tag_id))
    }

    /// All tags of a workspace, ordered by name.
    pub fn list_workspace_tags(&self, workspace_id: &str) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, workspace_id, name, color FROM tags
                 WHERE workspace_id = ?1 ORDER BY name, id",
            )?;
            let tags = stmt
                .query_map(params![workspace_id], parse_tag_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    pub fn get_tags_for_task(&self, task_id: &str) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.workspace_id, g.name, g.color
                 FROM task_tags tt JOIN tags g ON g.id = tt.tag_id
                 WHERE tt.task_id = ?1 ORDER BY g.name, g.id",
            )?;
            let tags = stmt
                .query_map(params![task_id], parse_tag_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    /// Attach a tag to a task. Both must live in the same workspace.
    /// Attaching an already attached tag is a no-op.
    pub fn assign_tag(&self, task_id: &str, tag_id: &str) -> Result<(), ApiError> {
        self.with_conn(|conn| {
            let task_ws = workspace_of_task_internal(conn, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;
            let tag = get_tag_internal(conn, tag_id)?.ok_or_else(|| ApiError::tag_not_found(tag_id))?;
            if tag.workspace_id != task_ws {
                return Err(ApiError::workspace_mismatch("Tag").into());
            }
            conn.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
                params![task_id, tag_id],
            )?;
            Ok(())
        })
        .map_err(ApiError::from)
    }

    /// Detach a tag from a task. Returns whether a link was removed.
    pub fn unassign_tag(&self, task_id: &str, tag_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
                params![task_id, tag_id],
            )?;
            Ok(removed > 0)
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
            task: task.id,
        }
    }

    #[test]
    fn workspace_tags_are_ordered_by_name() {
        let f = setup();
        f.db.create_tag(&f.ws, "zeta", None).unwrap();
        f.db.create_tag(&f.ws, "alpha", Some("#ff0000")).unwrap();
        f.db.create_tag(&f.other_ws, "beta", None).unwrap();

        let names: Vec<_> = f
            .db
            .list_workspace_tags(&f.ws)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn assign_tag_is_idempotent() {
        let f = setup();
        let tag = f.db.create_tag(&f.ws, "urgent", None).unwrap();

        f.db.assign_tag(&f.task, &tag.id).unwrap();
        f.db.assign_tag(&f.task, &tag.id).unwrap();
        assert_eq!(f.db.get_tags_for_task(&f.task).unwrap(), vec![tag.clone()]);

        assert!(f.db.unassign_tag(&f.task, &tag.id).unwrap());
        assert!(!f.db.unassign_tag(&f.task, &tag.id).unwrap());
        assert!(f.db.get_tags_for_task(&f.task).unwrap().is_empty());
    }

    #[test]
    fn assign_tag_rejects_foreign_workspace() {
        let f = setup();
        let foreign = f.db.create_tag(&f.other_ws, "foreign", None).unwrap();

        let err = f.db.assign_tag(&f.task, &foreign.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkspaceMismatch);
        assert!(f.db.get_tags_for_task(&f.task).unwrap().is_empty());
    }

    #[test]
    fn assign_tag_reports_missing_entities() {
        let f = setup();
        let tag = f.db.create_tag(&f.ws, "t", None).unwrap();

        assert_eq!(
            f.db.assign_tag("missing", &tag.id).unwrap_err().code,
            ErrorCode::TaskNotFound
        );
        assert_eq!(
            f.db.assign_tag(&f.task, "missing").unwrap_err().code,
            ErrorCode::TagNotFound
        );
    }
}
