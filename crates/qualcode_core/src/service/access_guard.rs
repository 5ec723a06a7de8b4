//! Project access guard: the single authorization decision point.
//!
//! # Invariants
//! - The owner always has read and write access.
//! - Collaborators read with any role; only `ReaderWriter` writes.
//! - An unknown project is `NotFound`, never `Denied`.

use crate::model::principal::Principal;
use crate::model::project::{Project, ProjectId};
use crate::model::resource::ResourceRef;
use crate::repo::ProjectRepository;
use crate::service::error::LifecycleError;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

/// Pure access decision over a loaded project.
pub fn decide(project: &Project, principal: &Principal, access: AccessLevel) -> AccessDecision {
    if project.is_owner(principal) {
        return AccessDecision::Allowed;
    }
    match project.collaborator(principal) {
        Some(collaborator) if access == AccessLevel::Read || collaborator.role.can_write() => {
            AccessDecision::Allowed
        }
        _ => AccessDecision::Denied,
    }
}

pub struct ProjectAccessGuard<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: ProjectRepository + ?Sized> ProjectAccessGuard<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Loads `project` and decides access for `principal`.
    pub fn check_access(
        &self,
        project: ProjectId,
        principal: &Principal,
        access: AccessLevel,
    ) -> Result<AccessDecision, LifecycleError> {
        self.load(project)
            .map(|loaded| decide(&loaded, principal, access))
    }

    /// Like `check_access`, but turns `Denied` into `Forbidden`.
    ///
    /// Returns the loaded project on success.
    pub fn require(
        &self,
        project: ProjectId,
        principal: &Principal,
        access: AccessLevel,
    ) -> Result<Project, LifecycleError> {
        let loaded = self.load(project)?;
        match decide(&loaded, principal, access) {
            AccessDecision::Allowed => Ok(loaded),
            AccessDecision::Denied => {
                warn!(
                    "event=access_check module=guard status=denied project={} access={}",
                    project,
                    access.as_str()
                );
                Err(LifecycleError::Forbidden { project })
            }
        }
    }

    fn load(&self, project: ProjectId) -> Result<Project, LifecycleError> {
        self.store
            .get_project(project)?
            .ok_or(LifecycleError::NotFound(ResourceRef::Project(project)))
    }
}
