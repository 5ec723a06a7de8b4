//! Project collection: project rows, embedded collaborators and code system.
//!
//! # Invariants
//! - Collaborator rows are replaced as a whole on every project write.
//! - `code_system` is stored as JSON and decoded strictly on read.
//! - Listing is deterministic: `name ASC, project_uuid ASC`.

use crate::model::code_system::CodeSystem;
use crate::model::principal::Principal;
use crate::model::project::{Collaborator, CollaboratorRole, Project, ProjectId};
use crate::model::scope::ScopePredicate;
use crate::repo::{
    decode_json, encode_json, parse_audit, parse_principal, parse_uuid, scope_clause, RepoError,
    RepoResult, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    project_uuid,
    owner,
    name,
    code_system,
    created_by,
    modified_by,
    modified_at
FROM projects";

/// Repository interface for the `project` collection.
pub trait ProjectRepository {
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn find_project_by_owner_and_name(
        &self,
        owner: &Principal,
        name: &str,
    ) -> RepoResult<Option<Project>>;
    fn list_projects(&self, scope: &ScopePredicate) -> RepoResult<Vec<Project>>;
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    /// Replaces the stored project. Returns `false` when no row matched.
    fn update_project(&self, project: &Project) -> RepoResult<bool>;
    /// Sets `modified_by` / `modified_at` only. Never creates a row.
    fn stamp_project(&self, id: ProjectId, principal: &Principal, now: i64) -> RepoResult<bool>;
    fn remove_project(&self, id: ProjectId) -> RepoResult<bool>;
}

impl ProjectRepository for SqliteStore<'_> {
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE project_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(self.conn(), row)?));
        }
        Ok(None)
    }

    fn find_project_by_owner_and_name(
        &self,
        owner: &Principal,
        name: &str,
    ) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn().prepare(&format!(
            "{PROJECT_SELECT_SQL} WHERE owner = ?1 AND name = ?2;"
        ))?;
        let mut rows = stmt.query(params![owner.as_str(), name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(self.conn(), row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, scope: &ScopePredicate) -> RepoResult<Vec<Project>> {
        let mut bind_values: Vec<Value> = Vec::new();
        let condition = scope_clause(scope, "project_uuid", &mut bind_values);
        let sql =
            format!("{PROJECT_SELECT_SQL} WHERE {condition} ORDER BY name ASC, project_uuid ASC;");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(self.conn(), row)?);
        }
        Ok(projects)
    }

    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        let code_system = encode_code_system(project.code_system.as_ref())?;
        self.with_savepoint("project_insert", |conn| {
            conn.execute(
                "INSERT INTO projects (
                    project_uuid,
                    owner,
                    name,
                    code_system,
                    created_by,
                    modified_by,
                    modified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    project.id.to_string(),
                    project.owner.as_str(),
                    project.name.as_str(),
                    code_system,
                    project.audit.created_by.as_str(),
                    project.audit.modified_by.as_str(),
                    project.audit.modified_at,
                ],
            )?;
            replace_collaborators(conn, project.id, &project.collaborators)
        })
    }

    fn update_project(&self, project: &Project) -> RepoResult<bool> {
        let code_system = encode_code_system(project.code_system.as_ref())?;
        self.with_savepoint("project_update", |conn| {
            let changed = conn.execute(
                "UPDATE projects
                 SET
                    name = ?2,
                    code_system = ?3,
                    modified_by = ?4,
                    modified_at = ?5
                 WHERE project_uuid = ?1;",
                params![
                    project.id.to_string(),
                    project.name.as_str(),
                    code_system,
                    project.audit.modified_by.as_str(),
                    project.audit.modified_at,
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            replace_collaborators(conn, project.id, &project.collaborators)?;
            Ok(true)
        })
    }

    fn stamp_project(&self, id: ProjectId, principal: &Principal, now: i64) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "UPDATE projects
             SET modified_by = ?2,
                 modified_at = ?3
             WHERE project_uuid = ?1;",
            params![id.to_string(), principal.as_str(), now],
        )?;
        Ok(changed > 0)
    }

    fn remove_project(&self, id: ProjectId) -> RepoResult<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM projects WHERE project_uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn replace_collaborators(
    conn: &Connection,
    project: ProjectId,
    collaborators: &[Collaborator],
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM project_collaborators WHERE project_uuid = ?1;",
        [project.to_string()],
    )?;
    for (position, collaborator) in collaborators.iter().enumerate() {
        conn.execute(
            "INSERT INTO project_collaborators (project_uuid, position, email, role)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                project.to_string(),
                position as i64,
                collaborator.email.as_str(),
                collaborator.role.as_str(),
            ],
        )?;
    }
    Ok(())
}

fn load_collaborators(conn: &Connection, project: ProjectId) -> RepoResult<Vec<Collaborator>> {
    let mut stmt = conn.prepare(
        "SELECT email, role
         FROM project_collaborators
         WHERE project_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([project.to_string()])?;
    let mut collaborators = Vec::new();
    while let Some(row) = rows.next()? {
        let email: String = row.get("email")?;
        let role_text: String = row.get("role")?;
        let role = CollaboratorRole::parse(&role_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid role `{role_text}` in project_collaborators.role"
            ))
        })?;
        collaborators.push(Collaborator {
            email: parse_principal(&email, "project_collaborators.email")?,
            role,
        });
    }
    Ok(collaborators)
}

fn parse_project_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("project_uuid")?;
    let id = parse_uuid(&id_text, "projects.project_uuid")?;
    let owner: String = row.get("owner")?;
    let code_system = row
        .get::<_, Option<String>>("code_system")?
        .map(|value| decode_json::<CodeSystem>(&value, "projects.code_system"))
        .transpose()?;

    Ok(Project {
        id,
        owner: parse_principal(&owner, "projects.owner")?,
        name: row.get("name")?,
        collaborators: load_collaborators(conn, id)?,
        code_system,
        audit: parse_audit(row, "projects")?,
    })
}

fn encode_code_system(code_system: Option<&CodeSystem>) -> RepoResult<Option<String>> {
    code_system
        .map(|tree| encode_json(tree, "projects.code_system"))
        .transpose()
}
