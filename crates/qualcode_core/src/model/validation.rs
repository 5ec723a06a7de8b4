//! Record-level validation errors shared by all resource kinds.

use crate::model::code::CodeId;
use crate::model::principal::Principal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation failures detected before any persistence write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required display name is blank after trim.
    BlankName(&'static str),
    /// The same email is listed twice in one collaborator list.
    DuplicateCollaborator(Principal),
    /// The owner cannot also be a collaborator of the project.
    OwnerListedAsCollaborator(Principal),
    /// The code system carries more than one node for the same code.
    DuplicateCodeNode(CodeId),
    /// Quote `end_offset` precedes `start_offset`.
    InvertedQuoteOffsets { start: u32, end: u32 },
    /// A document lists a quote extracted from another document.
    QuoteOfOtherDocument { quote: Uuid, document: Uuid },
    /// A referenced record belongs to another project.
    ProjectMismatch {
        expected: Uuid,
        actual: Uuid,
        field: &'static str,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(kind) => write!(f, "{kind} name must not be blank"),
            Self::DuplicateCollaborator(email) => {
                write!(f, "collaborator listed more than once: {email}")
            }
            Self::OwnerListedAsCollaborator(email) => {
                write!(f, "project owner cannot be a collaborator: {email}")
            }
            Self::DuplicateCodeNode(code) => {
                write!(f, "code system lists code {code} more than once")
            }
            Self::InvertedQuoteOffsets { start, end } => {
                write!(f, "quote end offset {end} precedes start offset {start}")
            }
            Self::QuoteOfOtherDocument { quote, document } => {
                write!(f, "quote {quote} belongs to document {document}")
            }
            Self::ProjectMismatch {
                expected,
                actual,
                field,
            } => write!(
                f,
                "{field} belongs to project {actual}, expected project {expected}"
            ),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn normalize_name(
    value: &str,
    kind: &'static str,
) -> Result<String, ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankName(kind));
    }
    Ok(trimmed.to_string())
}
