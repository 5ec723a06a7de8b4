//! Project aggregate: owner, collaborators and the embedded code system.
//!
//! # Invariants
//! - `(owner, name)` is unique across all stored projects.
//! - Collaborator emails are unique and never equal to the owner.
//! - The code system is persisted as part of the project, never on its own.

use crate::model::audit::AuditFields;
use crate::model::code_system::CodeSystem;
use crate::model::principal::Principal;
use crate::model::validation::{normalize_name, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Access role granted to a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    /// May see the project and its resources.
    Reader,
    /// May also insert, update and delete project resources.
    ReaderWriter,
}

impl CollaboratorRole {
    pub fn can_write(self) -> bool {
        matches!(self, Self::ReaderWriter)
    }

    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::ReaderWriter => "reader_writer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reader" => Some(Self::Reader),
            "reader_writer" => Some(Self::ReaderWriter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub email: Principal,
    pub role: CollaboratorRole,
}

impl Collaborator {
    pub fn new(email: Principal, role: CollaboratorRole) -> Self {
        Self { email, role }
    }
}

/// Stored project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner: Principal,
    pub name: String,
    /// Ordered as entered by the owner.
    pub collaborators: Vec<Collaborator>,
    pub code_system: Option<CodeSystem>,
    pub audit: AuditFields,
}

impl Project {
    pub fn is_owner(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// Returns the collaborator entry for `principal`, if listed.
    pub fn collaborator(&self, principal: &Principal) -> Option<&Collaborator> {
        self.collaborators
            .iter()
            .find(|collaborator| &collaborator.email == principal)
    }

    /// Whether the project record itself is visible to `principal`.
    ///
    /// Role does not matter for visibility.
    pub fn is_visible_to(&self, principal: &Principal) -> bool {
        self.is_owner(principal) || self.collaborator(principal).is_some()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        normalize_name(&self.name, "project")?;
        validate_collaborators(&self.owner, &self.collaborators)?;
        if let Some(code) = self
            .code_system
            .as_ref()
            .and_then(CodeSystem::first_duplicate)
        {
            return Err(ModelValidationError::DuplicateCodeNode(code));
        }
        Ok(())
    }
}

/// Client-provided input for a new project. The owner is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub id: ProjectId,
    pub name: String,
    pub collaborators: Vec<Collaborator>,
    pub code_system: Option<CodeSystem>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            collaborators: Vec::new(),
            code_system: None,
        }
    }

    pub fn with_collaborator(mut self, email: Principal, role: CollaboratorRole) -> Self {
        self.collaborators.push(Collaborator::new(email, role));
        self
    }

    pub fn with_code_system(mut self, code_system: CodeSystem) -> Self {
        self.code_system = Some(code_system);
        self
    }

    /// Normalized name used for the uniqueness check.
    pub fn normalized_name(&self) -> Result<String, ModelValidationError> {
        normalize_name(&self.name, "project")
    }

    pub(crate) fn into_project(
        self,
        owner: &Principal,
        now: i64,
    ) -> Result<Project, ModelValidationError> {
        let project = Project {
            id: self.id,
            owner: owner.clone(),
            name: normalize_name(&self.name, "project")?,
            collaborators: self.collaborators,
            code_system: self.code_system,
            audit: AuditFields::created(owner, now),
        };
        project.validate()?;
        Ok(project)
    }
}

/// Partial update for a project. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub collaborators: Option<Vec<Collaborator>>,
    /// `Some(None)` clears the code system.
    pub code_system: Option<Option<CodeSystem>>,
}

impl ProjectChanges {
    pub(crate) fn apply_to(&self, project: &mut Project) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            project.name = normalize_name(name, "project")?;
        }
        if let Some(collaborators) = &self.collaborators {
            project.collaborators = collaborators.clone();
        }
        if let Some(code_system) = &self.code_system {
            project.code_system = code_system.clone();
        }
        project.validate()
    }
}

fn validate_collaborators(
    owner: &Principal,
    collaborators: &[Collaborator],
) -> Result<(), ModelValidationError> {
    let mut seen = BTreeSet::new();
    for collaborator in collaborators {
        if &collaborator.email == owner {
            return Err(ModelValidationError::OwnerListedAsCollaborator(
                collaborator.email.clone(),
            ));
        }
        if !seen.insert(&collaborator.email) {
            return Err(ModelValidationError::DuplicateCollaborator(
                collaborator.email.clone(),
            ));
        }
    }
    Ok(())
}
