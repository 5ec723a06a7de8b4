//! Quote collection.
//!
//! # Invariants
//! - Listing is deterministic: `document_uuid ASC, start_offset ASC, quote_uuid ASC`.

use crate::model::code::CodeId;
use crate::model::document::DocumentId;
use crate::model::quote::{Quote, QuoteId};
use crate::model::scope::ScopePredicate;
use crate::repo::{parse_audit, parse_uuid, scope_clause, RepoError, RepoResult, SqliteStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const QUOTE_SELECT_SQL: &str = "SELECT
    quote_uuid,
    project_uuid,
    document_uuid,
    code_uuid,
    fragment,
    start_offset,
    end_offset,
    created_by,
    modified_by,
    modified_at
FROM quotes";

/// Extra narrowing applied on top of the scope predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub document: Option<DocumentId>,
    pub code: Option<CodeId>,
}

impl QuoteFilter {
    pub fn by_code(code: CodeId) -> Self {
        Self {
            document: None,
            code: Some(code),
        }
    }
}

/// Repository interface for the `quote` collection.
pub trait QuoteRepository {
    fn get_quote(&self, id: QuoteId) -> RepoResult<Option<Quote>>;
    fn list_quotes(&self, scope: &ScopePredicate, filter: &QuoteFilter) -> RepoResult<Vec<Quote>>;
    fn insert_quote(&self, quote: &Quote) -> RepoResult<()>;
    fn update_quote(&self, quote: &Quote) -> RepoResult<bool>;
    fn remove_quote(&self, id: QuoteId) -> RepoResult<bool>;
}

impl QuoteRepository for SqliteStore<'_> {
    fn get_quote(&self, id: QuoteId) -> RepoResult<Option<Quote>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{QUOTE_SELECT_SQL} WHERE quote_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_quote_row(row)?));
        }
        Ok(None)
    }

    fn list_quotes(&self, scope: &ScopePredicate, filter: &QuoteFilter) -> RepoResult<Vec<Quote>> {
        let mut bind_values: Vec<Value> = Vec::new();
        let condition = scope_clause(scope, "project_uuid", &mut bind_values);
        let mut sql = format!("{QUOTE_SELECT_SQL} WHERE {condition}");

        if let Some(document) = filter.document {
            sql.push_str(" AND document_uuid = ?");
            bind_values.push(Value::Text(document.to_string()));
        }
        if let Some(code) = filter.code {
            sql.push_str(" AND code_uuid = ?");
            bind_values.push(Value::Text(code.to_string()));
        }
        sql.push_str(" ORDER BY document_uuid ASC, start_offset ASC, quote_uuid ASC;");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut quotes = Vec::new();
        while let Some(row) = rows.next()? {
            quotes.push(parse_quote_row(row)?);
        }
        Ok(quotes)
    }

    fn insert_quote(&self, quote: &Quote) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO quotes (
                quote_uuid,
                project_uuid,
                document_uuid,
                code_uuid,
                fragment,
                start_offset,
                end_offset,
                created_by,
                modified_by,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                quote.id.to_string(),
                quote.project.to_string(),
                quote.document.to_string(),
                quote.code.map(|value| value.to_string()),
                quote.fragment.as_str(),
                i64::from(quote.start_offset),
                i64::from(quote.end_offset),
                quote.audit.created_by.as_str(),
                quote.audit.modified_by.as_str(),
                quote.audit.modified_at,
            ],
        )?;
        Ok(())
    }

    fn update_quote(&self, quote: &Quote) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "UPDATE quotes
             SET
                code_uuid = ?2,
                fragment = ?3,
                start_offset = ?4,
                end_offset = ?5,
                modified_by = ?6,
                modified_at = ?7
             WHERE quote_uuid = ?1;",
            params![
                quote.id.to_string(),
                quote.code.map(|value| value.to_string()),
                quote.fragment.as_str(),
                i64::from(quote.start_offset),
                i64::from(quote.end_offset),
                quote.audit.modified_by.as_str(),
                quote.audit.modified_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_quote(&self, id: QuoteId) -> RepoResult<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM quotes WHERE quote_uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_quote_row(row: &Row<'_>) -> RepoResult<Quote> {
    let id_text: String = row.get("quote_uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let document_text: String = row.get("document_uuid")?;
    let code = row
        .get::<_, Option<String>>("code_uuid")?
        .map(|value| parse_uuid(&value, "quotes.code_uuid"))
        .transpose()?;

    let quote = Quote {
        id: parse_uuid(&id_text, "quotes.quote_uuid")?,
        project: parse_uuid(&project_text, "quotes.project_uuid")?,
        document: parse_uuid(&document_text, "quotes.document_uuid")?,
        code,
        fragment: row.get("fragment")?,
        start_offset: parse_offset(row.get("start_offset")?, "quotes.start_offset")?,
        end_offset: parse_offset(row.get("end_offset")?, "quotes.end_offset")?,
        audit: parse_audit(row, "quotes")?,
    };
    quote
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(quote)
}

fn parse_offset(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid offset `{value}` in {column}")))
}
