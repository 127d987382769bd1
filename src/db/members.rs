//! Workspace membership and the authorization gate.
//!
//! Every workspace-scoped operation asks `role_of` first. Roles are ranked
//! Guest < Member < Admin < Owner; `require_role` rejects callers below the
//! requested minimum with a 403.

use super::{Database, optional};
use crate::error::ApiError;
use crate::types::Role;
use anyhow::Result;
use rusqlite::{Connection, params};

pub(crate) fn role_of_internal(conn: &Connection, user_id: &str, workspace_id: &str) -> Result<Option<Role>> {
    let stored: Option<String> = optional(conn.query_row(
        "SELECT role FROM workspace_members
         WHERE user_id = ?1 AND workspace_id = ?2 AND is_active = 1",
        params![user_id, workspace_id],
        |row| row.get(0),
    ))?;
    Ok(stored.as_deref().and_then(Role::parse))
}

impl Database {
    /// Add a member or change an existing member's role.
    pub fn add_member(&self, workspace_id: &str, user_id: &str, role: Role) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?1, ?2, ?3)
                 ON CONFLICT(workspace_id, user_id) DO UPDATE SET role = excluded.role, is_active = 1",
                params![workspace_id, user_id, role.as_str()],
            )?;
            Ok(())
        })
    }

    /// The caller's role in a workspace, or `None` for no access.
    pub fn role_of(&self, user_id: &str, workspace_id: &str) -> Result<Option<Role>> {
        self.with_conn(|conn| role_of_internal(conn, user_id, workspace_id))
    }

    pub fn has_min_role(&self, user_id: &str, workspace_id: &str, minimum: Role) -> Result<bool> {
        Ok(self
            .role_of(user_id, workspace_id)?
            .is_some_and(|role| role >= minimum))
    }

    /// Enforce that the user holds at least `minimum` in the workspace.
    pub fn require_role(&self, user_id: &str, workspace_id: &str, minimum: Role) -> Result<Role, ApiError> {
        match self.role_of(user_id, workspace_id)? {
            Some(role) if role >= minimum => Ok(role),
            _ => {
                tracing::debug!(
                    user_id,
                    workspace_id,
                    minimum = %minimum,
                    "role check failed"
                );
                Err(ApiError::forbidden(format!(
                    "Requires role '{}' or higher in workspace {}",
                    minimum, workspace_id
                )))
            }
        }
    }

    /// Any membership grants view access.
    pub fn require_any_role(&self, user_id: &str, workspace_id: &str) -> Result<Role, ApiError> {
        self.require_role(user_id, workspace_id, Role::Guest)
            .map_err(|_| ApiError::forbidden("No access to this workspace"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn setup() -> (Database, String, String) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("owner@example.com", None).unwrap();
        let ws = db.create_workspace("WS", &owner.id).unwrap();
        (db, owner.id, ws.id)
    }

    #[test]
    fn non_member_has_no_role() {
        let (db, _, ws) = setup();
        let stranger = db.create_user("stranger@example.com", None).unwrap();

        assert_eq!(db.role_of(&stranger.id, &ws).unwrap(), None);
        assert!(!db.has_min_role(&stranger.id, &ws, Role::Guest).unwrap());
        let err = db.require_role(&stranger.id, &ws, Role::Guest).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn require_role_respects_rank() {
        let (db, _, ws) = setup();
        let guest = db.create_user("guest@example.com", None).unwrap();
        db.add_member(&ws, &guest.id, Role::Guest).unwrap();

        assert!(db.require_role(&guest.id, &ws, Role::Guest).is_ok());
        assert!(db.require_role(&guest.id, &ws, Role::Member).is_err());

        db.add_member(&ws, &guest.id, Role::Admin).unwrap();
        assert_eq!(
            db.require_role(&guest.id, &ws, Role::Member).unwrap(),
            Role::Admin
        );
    }

    #[test]
    fn unknown_stored_role_is_no_access() {
        let (db, _, ws) = setup();
        let user = db.create_user("odd@example.com", None).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?1, ?2, 'viewer')",
                params![ws, user.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.role_of(&user.id, &ws).unwrap(), None);
    }

    #[test]
    fn stored_role_is_case_insensitive() {
        let (db, _, ws) = setup();
        let user = db.create_user("lower@example.com", None).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?1, ?2, 'member')",
                params![ws, user.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.role_of(&user.id, &ws).unwrap(), Some(Role::Member));
    }
}
