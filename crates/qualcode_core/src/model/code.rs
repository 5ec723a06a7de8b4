//! Code records of a project's tagging taxonomy.

use crate::model::audit::AuditFields;
use crate::model::principal::Principal;
use crate::model::project::ProjectId;
use crate::model::validation::{normalize_name, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CodeId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: CodeId,
    pub project: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDraft {
    pub id: CodeId,
    pub project: ProjectId,
    pub name: String,
    pub description: Option<String>,
}

impl CodeDraft {
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn into_code(
        self,
        principal: &Principal,
        now: i64,
    ) -> Result<Code, ModelValidationError> {
        Ok(Code {
            id: self.id,
            project: self.project,
            name: normalize_name(&self.name, "code")?,
            description: self.description,
            audit: AuditFields::created(principal, now),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl CodeChanges {
    pub(crate) fn apply_to(&self, code: &mut Code) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            code.name = normalize_name(name, "code")?;
        }
        if let Some(description) = &self.description {
            code.description = description.clone();
        }
        Ok(())
    }
}
