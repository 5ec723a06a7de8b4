//! Document records.

use crate::model::audit::AuditFields;
use crate::model::principal::Principal;
use crate::model::project::ProjectId;
use crate::model::quote::QuoteId;
use crate::model::validation::{normalize_name, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DocumentId = Uuid;

/// Stored document. `quotes` keeps the order quotes were attached in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub project: ProjectId,
    pub name: String,
    pub content: String,
    pub quotes: Vec<QuoteId>,
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub id: DocumentId,
    pub project: ProjectId,
    pub name: String,
    pub content: String,
    pub quotes: Vec<QuoteId>,
}

impl DocumentDraft {
    pub fn new(project: ProjectId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
            name: name.into(),
            content: content.into(),
            quotes: Vec::new(),
        }
    }

    pub fn with_quotes(mut self, quotes: Vec<QuoteId>) -> Self {
        self.quotes = quotes;
        self
    }

    pub(crate) fn into_document(
        self,
        principal: &Principal,
        now: i64,
    ) -> Result<Document, ModelValidationError> {
        Ok(Document {
            id: self.id,
            project: self.project,
            name: normalize_name(&self.name, "document")?,
            content: self.content,
            quotes: self.quotes,
            audit: AuditFields::created(principal, now),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentChanges {
    pub name: Option<String>,
    pub content: Option<String>,
    pub quotes: Option<Vec<QuoteId>>,
}

impl DocumentChanges {
    pub(crate) fn apply_to(&self, document: &mut Document) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            document.name = normalize_name(name, "document")?;
        }
        if let Some(content) = &self.content {
            document.content = content.clone();
        }
        if let Some(quotes) = &self.quotes {
            document.quotes = quotes.clone();
        }
        Ok(())
    }
}
