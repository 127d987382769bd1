//! Users and the workspace → space → folder → list containment chain.

use super::{Database, new_id, now_ms, optional};
use crate::types::{Folder, Role, Space, TaskList, User, Workspace};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};

/// Resolve the workspace that owns a list (list → space → workspace).
pub(crate) fn workspace_of_list_internal(conn: &Connection, list_id: &str) -> Result<Option<String>> {
    optional(conn.query_row(
        "SELECT s.workspace_id FROM lists l
         JOIN spaces s ON s.id = l.space_id
         WHERE l.id = ?1",
        params![list_id],
        |row| row.get(0),
    ))
}

/// Resolve the workspace that owns a task (task → list → space → workspace).
pub(crate) fn workspace_of_task_internal(conn: &Connection, task_id: &str) -> Result<Option<String>> {
    optional(conn.query_row(
        "SELECT s.workspace_id FROM tasks t
         JOIN lists l ON l.id = t.list_id
         JOIN spaces s ON s.id = l.space_id
         WHERE t.id = ?1",
        params![task_id],
        |row| row.get(0),
    ))
}

impl Database {
    pub fn create_user(&self, email: &str, full_name: Option<&str>) -> Result<User> {
        let user = User {
            id: new_id(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            created_at: now_ms(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, full_name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.email, user.full_name, user.created_at],
            )?;
            Ok(())
        })?;
        Ok(user)
    }

    /// Create a workspace. The owner becomes an `Owner` member.
    pub fn create_workspace(&self, name: &str, owner_id: &str) -> Result<Workspace> {
        let workspace = Workspace {
            id: new_id(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now_ms(),
        };
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO workspaces (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    workspace.id,
                    workspace.name,
                    workspace.owner_id,
                    workspace.created_at
                ],
            )?;
            tx.execute(
                "INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?1, ?2, ?3)",
                params![workspace.id, owner_id, Role::Owner.as_str()],
            )?;
            tx.commit()?;
            Ok(())
        })?;
        Ok(workspace)
    }

    pub fn create_space(&self, workspace_id: &str, name: &str) -> Result<Space> {
        let space = Space {
            id: new_id(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO spaces (id, workspace_id, name) VALUES (?1, ?2, ?3)",
                params![space.id, space.workspace_id, space.name],
            )?;
            Ok(())
        })?;
        Ok(space)
    }

    pub fn create_folder(&self, space_id: &str, name: &str) -> Result<Folder> {
        let folder = Folder {
            id: new_id(),
            space_id: space_id.to_string(),
            name: name.to_string(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO folders (id, space_id, name) VALUES (?1, ?2, ?3)",
                params![folder.id, folder.space_id, folder.name],
            )?;
            Ok(())
        })?;
        Ok(folder)
    }

    /// Create a list in a space, optionally inside a folder of that space.
    pub fn create_list(&self, space_id: &str, folder_id: Option<&str>, name: &str) -> Result<TaskList> {
        let list = TaskList {
            id: new_id(),
            space_id: space_id.to_string(),
            folder_id: folder_id.map(str::to_string),
            name: name.to_string(),
        };
        self.with_conn(|conn| {
            if let Some(fid) = folder_id {
                let folder_space: Option<String> = optional(conn.query_row(
                    "SELECT space_id FROM folders WHERE id = ?1",
                    params![fid],
                    |row| row.get(0),
                ))?;
                match folder_space {
                    Some(ref sid) if sid == space_id => {}
                    Some(_) => return Err(anyhow!("Folder {} belongs to a different space", fid)),
                    None => return Err(anyhow!("Folder not found: {}", fid)),
                }
            }
            conn.execute(
                "INSERT INTO lists (id, space_id, folder_id, name) VALUES (?1, ?2, ?3, ?4)",
                params![list.id, list.space_id, list.folder_id, list.name],
            )?;
            Ok(())
        })?;
        Ok(list)
    }

    pub fn get_list(&self, list_id: &str) -> Result<Option<TaskList>> {
        self.with_conn(|conn| {
            optional(conn.query_row(
                "SELECT id, space_id, folder_id, name FROM lists WHERE id = ?1",
                params![list_id],
                |row| {
                    Ok(TaskList {
                        id: row.get(0)?,
                        space_id: row.get(1)?,
                        folder_id: row.get(2)?,
                        name: row.get(3)?,
                    })
                },
            ))
        })
    }

    pub fn workspace_exists(&self, workspace_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = optional(conn.query_row(
                "SELECT 1 FROM workspaces WHERE id = ?1",
                params![workspace_id],
                |row| row.get(0),
            ))?;
            Ok(found.is_some())
        })
    }

    pub fn workspace_of_list(&self, list_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| workspace_of_list_internal(conn, list_id))
    }

    pub fn workspace_of_task(&self, task_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| workspace_of_task_internal(conn, task_id))
    }
}
