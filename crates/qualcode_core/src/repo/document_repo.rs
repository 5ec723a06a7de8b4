//! Document collection.
//!
//! # Invariants
//! - `quotes` is stored as a JSON array and keeps attachment order.
//! - Listing is deterministic: `name ASC, document_uuid ASC`.

use crate::model::document::{Document, DocumentId};
use crate::model::quote::QuoteId;
use crate::model::scope::ScopePredicate;
use crate::repo::{
    decode_json, encode_json, parse_audit, parse_uuid, scope_clause, RepoResult, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const DOCUMENT_SELECT_SQL: &str = "SELECT
    document_uuid,
    project_uuid,
    name,
    content,
    quotes,
    created_by,
    modified_by,
    modified_at
FROM documents";

/// Repository interface for the `document` collection.
pub trait DocumentRepository {
    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>>;
    fn list_documents(&self, scope: &ScopePredicate) -> RepoResult<Vec<Document>>;
    fn insert_document(&self, document: &Document) -> RepoResult<()>;
    fn update_document(&self, document: &Document) -> RepoResult<bool>;
    fn remove_document(&self, id: DocumentId) -> RepoResult<bool>;
}

impl DocumentRepository for SqliteStore<'_> {
    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE document_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    fn list_documents(&self, scope: &ScopePredicate) -> RepoResult<Vec<Document>> {
        let mut bind_values: Vec<Value> = Vec::new();
        let condition = scope_clause(scope, "project_uuid", &mut bind_values);
        let sql = format!(
            "{DOCUMENT_SELECT_SQL} WHERE {condition} ORDER BY name ASC, document_uuid ASC;"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn insert_document(&self, document: &Document) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO documents (
                document_uuid,
                project_uuid,
                name,
                content,
                quotes,
                created_by,
                modified_by,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                document.id.to_string(),
                document.project.to_string(),
                document.name.as_str(),
                document.content.as_str(),
                encode_json(&document.quotes, "documents.quotes")?,
                document.audit.created_by.as_str(),
                document.audit.modified_by.as_str(),
                document.audit.modified_at,
            ],
        )?;
        Ok(())
    }

    fn update_document(&self, document: &Document) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "UPDATE documents
             SET
                name = ?2,
                content = ?3,
                quotes = ?4,
                modified_by = ?5,
                modified_at = ?6
             WHERE document_uuid = ?1;",
            params![
                document.id.to_string(),
                document.name.as_str(),
                document.content.as_str(),
                encode_json(&document.quotes, "documents.quotes")?,
                document.audit.modified_by.as_str(),
                document.audit.modified_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_document(&self, id: DocumentId) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "DELETE FROM documents WHERE document_uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id_text: String = row.get("document_uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let quotes_text: String = row.get("quotes")?;

    Ok(Document {
        id: parse_uuid(&id_text, "documents.document_uuid")?,
        project: parse_uuid(&project_text, "documents.project_uuid")?,
        name: row.get("name")?,
        content: row.get("content")?,
        quotes: decode_json::<Vec<QuoteId>>(&quotes_text, "documents.quotes")?,
        audit: parse_audit(row, "documents")?,
    })
}
