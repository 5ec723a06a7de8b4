//! Code collection.

use crate::model::code::{Code, CodeId};
use crate::model::scope::ScopePredicate;
use crate::repo::{parse_audit, parse_uuid, scope_clause, RepoResult, SqliteStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const CODE_SELECT_SQL: &str = "SELECT
    code_uuid,
    project_uuid,
    name,
    description,
    created_by,
    modified_by,
    modified_at
FROM codes";

/// Repository interface for the `code` collection.
pub trait CodeRepository {
    fn get_code(&self, id: CodeId) -> RepoResult<Option<Code>>;
    fn list_codes(&self, scope: &ScopePredicate) -> RepoResult<Vec<Code>>;
    fn insert_code(&self, code: &Code) -> RepoResult<()>;
    fn update_code(&self, code: &Code) -> RepoResult<bool>;
    fn remove_code(&self, id: CodeId) -> RepoResult<bool>;
}

impl CodeRepository for SqliteStore<'_> {
    fn get_code(&self, id: CodeId) -> RepoResult<Option<Code>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{CODE_SELECT_SQL} WHERE code_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_code_row(row)?));
        }
        Ok(None)
    }

    fn list_codes(&self, scope: &ScopePredicate) -> RepoResult<Vec<Code>> {
        let mut bind_values: Vec<Value> = Vec::new();
        let condition = scope_clause(scope, "project_uuid", &mut bind_values);
        let sql = format!("{CODE_SELECT_SQL} WHERE {condition} ORDER BY name ASC, code_uuid ASC;");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut codes = Vec::new();
        while let Some(row) = rows.next()? {
            codes.push(parse_code_row(row)?);
        }
        Ok(codes)
    }

    fn insert_code(&self, code: &Code) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO codes (
                code_uuid,
                project_uuid,
                name,
                description,
                created_by,
                modified_by,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                code.id.to_string(),
                code.project.to_string(),
                code.name.as_str(),
                code.description.as_deref(),
                code.audit.created_by.as_str(),
                code.audit.modified_by.as_str(),
                code.audit.modified_at,
            ],
        )?;
        Ok(())
    }

    fn update_code(&self, code: &Code) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "UPDATE codes
             SET
                name = ?2,
                description = ?3,
                modified_by = ?4,
                modified_at = ?5
             WHERE code_uuid = ?1;",
            params![
                code.id.to_string(),
                code.name.as_str(),
                code.description.as_deref(),
                code.audit.modified_by.as_str(),
                code.audit.modified_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_code(&self, id: CodeId) -> RepoResult<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM codes WHERE code_uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_code_row(row: &Row<'_>) -> RepoResult<Code> {
    let id_text: String = row.get("code_uuid")?;
    let project_text: String = row.get("project_uuid")?;

    Ok(Code {
        id: parse_uuid(&id_text, "codes.code_uuid")?,
        project: parse_uuid(&project_text, "codes.project_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        audit: parse_audit(row, "codes")?,
    })
}
