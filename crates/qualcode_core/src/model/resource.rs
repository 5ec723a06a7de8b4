//! Closed set of resource kinds with typed payloads.
//!
//! Every dispatch on resource kind goes through these enums so that adding a
//! kind is a compile error at each unhandled match.

use crate::model::audit::AuditFields;
use crate::model::code::{Code, CodeChanges, CodeDraft, CodeId};
use crate::model::document::{Document, DocumentChanges, DocumentDraft, DocumentId};
use crate::model::principal::Principal;
use crate::model::project::{Project, ProjectChanges, ProjectDraft, ProjectId};
use crate::model::quote::{Quote, QuoteChanges, QuoteDraft, QuoteId};
use crate::model::validation::ModelValidationError;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Project,
    Document,
    Quote,
    Code,
}

impl ResourceKind {
    /// Collection name used in logs and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Document => "document",
            Self::Quote => "quote",
            Self::Code => "code",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Project(ProjectId),
    Document(DocumentId),
    Quote(QuoteId),
    Code(CodeId),
}

impl ResourceRef {
    pub fn kind(self) -> ResourceKind {
        match self {
            Self::Project(_) => ResourceKind::Project,
            Self::Document(_) => ResourceKind::Document,
            Self::Quote(_) => ResourceKind::Quote,
            Self::Code(_) => ResourceKind::Code,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Project(id) | Self::Document(id) | Self::Quote(id) | Self::Code(id) => id,
        }
    }
}

impl Display for ResourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// One stored record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Project(Project),
    Document(Document),
    Quote(Quote),
    Code(Code),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        self.reference().kind()
    }

    pub fn reference(&self) -> ResourceRef {
        match self {
            Self::Project(project) => ResourceRef::Project(project.id),
            Self::Document(document) => ResourceRef::Document(document.id),
            Self::Quote(quote) => ResourceRef::Quote(quote.id),
            Self::Code(code) => ResourceRef::Code(code.id),
        }
    }

    /// Project whose access rules govern this record. A project owns itself.
    pub fn owning_project(&self) -> ProjectId {
        match self {
            Self::Project(project) => project.id,
            Self::Document(document) => document.project,
            Self::Quote(quote) => quote.project,
            Self::Code(code) => code.project,
        }
    }

    pub fn audit(&self) -> &AuditFields {
        match self {
            Self::Project(project) => &project.audit,
            Self::Document(document) => &document.audit,
            Self::Quote(quote) => &quote.audit,
            Self::Code(code) => &code.audit,
        }
    }

    pub(crate) fn audit_mut(&mut self) -> &mut AuditFields {
        match self {
            Self::Project(project) => &mut project.audit,
            Self::Document(document) => &mut document.audit,
            Self::Quote(quote) => &mut quote.audit,
            Self::Code(code) => &mut code.audit,
        }
    }
}

/// Client input for a record that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDraft {
    Project(ProjectDraft),
    Document(DocumentDraft),
    Quote(QuoteDraft),
    Code(CodeDraft),
}

impl ResourceDraft {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Project(_) => ResourceKind::Project,
            Self::Document(_) => ResourceKind::Document,
            Self::Quote(_) => ResourceKind::Quote,
            Self::Code(_) => ResourceKind::Code,
        }
    }

    /// Owning project for non-project drafts; `None` for a new project.
    pub fn owning_project(&self) -> Option<ProjectId> {
        match self {
            Self::Project(_) => None,
            Self::Document(draft) => Some(draft.project),
            Self::Quote(draft) => Some(draft.project),
            Self::Code(draft) => Some(draft.project),
        }
    }

    /// Builds the stored record stamped with creation audit fields.
    pub(crate) fn into_resource(
        self,
        principal: &Principal,
        now: i64,
    ) -> Result<Resource, ModelValidationError> {
        match self {
            Self::Project(draft) => draft.into_project(principal, now).map(Resource::Project),
            Self::Document(draft) => draft.into_document(principal, now).map(Resource::Document),
            Self::Quote(draft) => draft.into_quote(principal, now).map(Resource::Quote),
            Self::Code(draft) => draft.into_code(principal, now).map(Resource::Code),
        }
    }
}

impl From<ProjectDraft> for ResourceDraft {
    fn from(value: ProjectDraft) -> Self {
        Self::Project(value)
    }
}

impl From<DocumentDraft> for ResourceDraft {
    fn from(value: DocumentDraft) -> Self {
        Self::Document(value)
    }
}

impl From<QuoteDraft> for ResourceDraft {
    fn from(value: QuoteDraft) -> Self {
        Self::Quote(value)
    }
}

impl From<CodeDraft> for ResourceDraft {
    fn from(value: CodeDraft) -> Self {
        Self::Code(value)
    }
}

/// Partial update for an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChanges {
    Project(ProjectChanges),
    Document(DocumentChanges),
    Quote(QuoteChanges),
    Code(CodeChanges),
}

impl ResourceChanges {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Project(_) => ResourceKind::Project,
            Self::Document(_) => ResourceKind::Document,
            Self::Quote(_) => ResourceKind::Quote,
            Self::Code(_) => ResourceKind::Code,
        }
    }
}

/// Changes stamped by the pre-update hook with the modifying principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedChanges {
    pub changes: ResourceChanges,
    pub modified_by: Principal,
    pub modified_at: i64,
}

impl StampedChanges {
    /// Applies the changes to `resource` and records the modification.
    ///
    /// Returns `Ok(false)` when the change kind does not match the resource kind.
    pub(crate) fn apply_to(&self, resource: &mut Resource) -> Result<bool, ModelValidationError> {
        match (&self.changes, &mut *resource) {
            (ResourceChanges::Project(changes), Resource::Project(project)) => {
                changes.apply_to(project)?
            }
            (ResourceChanges::Document(changes), Resource::Document(document)) => {
                changes.apply_to(document)?
            }
            (ResourceChanges::Quote(changes), Resource::Quote(quote)) => changes.apply_to(quote)?,
            (ResourceChanges::Code(changes), Resource::Code(code)) => changes.apply_to(code)?,
            _ => return Ok(false),
        }
        resource
            .audit_mut()
            .touch(&self.modified_by, self.modified_at);
        Ok(true)
    }
}
