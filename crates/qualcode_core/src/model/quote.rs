//! Quote records: excerpts of one document, optionally tagged with one code.

use crate::model::audit::AuditFields;
use crate::model::code::CodeId;
use crate::model::document::DocumentId;
use crate::model::principal::Principal;
use crate::model::project::ProjectId;
use crate::model::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type QuoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub project: ProjectId,
    pub document: DocumentId,
    pub code: Option<CodeId>,
    pub fragment: String,
    /// Character offsets into the document content; `end_offset >= start_offset`.
    pub start_offset: u32,
    pub end_offset: u32,
    pub audit: AuditFields,
}

impl Quote {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_offsets(self.start_offset, self.end_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDraft {
    pub id: QuoteId,
    pub project: ProjectId,
    pub document: DocumentId,
    pub code: Option<CodeId>,
    pub fragment: String,
    pub start_offset: u32,
    pub end_offset: u32,
}

impl QuoteDraft {
    pub fn new(
        project: ProjectId,
        document: DocumentId,
        fragment: impl Into<String>,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
            document,
            code: None,
            fragment: fragment.into(),
            start_offset,
            end_offset,
        }
    }

    pub fn with_code(mut self, code: CodeId) -> Self {
        self.code = Some(code);
        self
    }

    pub(crate) fn into_quote(
        self,
        principal: &Principal,
        now: i64,
    ) -> Result<Quote, ModelValidationError> {
        let quote = Quote {
            id: self.id,
            project: self.project,
            document: self.document,
            code: self.code,
            fragment: self.fragment,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            audit: AuditFields::created(principal, now),
        };
        quote.validate()?;
        Ok(quote)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteChanges {
    /// `Some(None)` removes the code tag.
    pub code: Option<Option<CodeId>>,
    pub fragment: Option<String>,
    /// Both offsets are replaced together.
    pub offsets: Option<(u32, u32)>,
}

impl QuoteChanges {
    pub(crate) fn apply_to(&self, quote: &mut Quote) -> Result<(), ModelValidationError> {
        if let Some(code) = self.code {
            quote.code = code;
        }
        if let Some(fragment) = &self.fragment {
            quote.fragment = fragment.clone();
        }
        if let Some((start, end)) = self.offsets {
            quote.start_offset = start;
            quote.end_offset = end;
        }
        quote.validate()
    }
}

fn validate_offsets(start: u32, end: u32) -> Result<(), ModelValidationError> {
    if end < start {
        return Err(ModelValidationError::InvertedQuoteOffsets { start, end });
    }
    Ok(())
}
