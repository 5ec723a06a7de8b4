//! Lifecycle hook engine.
//!
//! # Responsibility
//! - Run the checks and stamping due at each mutation point of a request.
//! - Drive the cascade engine before a record is removed.
//!
//! # Invariants
//! - Every authorization and uniqueness check of a phase runs before the
//!   phase writes anything; a failure leaves the store untouched.
//! - Non-project writes require write access on the owning project and stamp
//!   that project's `modified_by` / `modified_at`.
//! - New projects are owned by the inserting principal.
//! - A document lists only its own quotes; a code system only codes of its
//!   project.

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::model::code::{Code, CodeId};
use crate::model::code_system::CodeSystem;
use crate::model::document::DocumentId;
use crate::model::principal::Principal;
use crate::model::project::{Project, ProjectId};
use crate::model::quote::{QuoteDraft, QuoteId};
use crate::model::resource::{
    Resource, ResourceChanges, ResourceDraft, ResourceKind, ResourceRef, StampedChanges,
};
use crate::model::scope::ScopePredicate;
use crate::model::validation::ModelValidationError;
use crate::repo::ResourceStore;
use crate::service::access_guard::{AccessLevel, ProjectAccessGuard};
use crate::service::cascade::{CascadeDeleteEngine, CascadeReport};
use crate::service::code_tree;
use crate::service::error::LifecycleError;
use crate::service::scope_filter::ScopeFilter;
use log::{info, warn};
use std::collections::BTreeSet;

/// Mutation points at which hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    PreRead,
    PreInsert,
    PreUpdate,
    PreDelete,
}

impl LifecyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreRead => "pre_read",
            Self::PreInsert => "pre_insert",
            Self::PreUpdate => "pre_update",
            Self::PreDelete => "pre_delete",
        }
    }
}

pub struct LifecycleHookEngine<'s, S: ?Sized, C: ?Sized> {
    store: &'s S,
    clock: &'s C,
    config: CoreConfig,
}

impl<'s, S, C> LifecycleHookEngine<'s, S, C>
where
    S: ResourceStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'s S, clock: &'s C, config: CoreConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Scope predicate for a list of `kind`, optionally naming one project.
    pub fn pre_read(
        &self,
        principal: &Principal,
        kind: ResourceKind,
        project_filter: Option<ProjectId>,
    ) -> Result<ScopePredicate, LifecycleError> {
        let result = ScopeFilter::new(self.store, self.config.unfiltered_lists).scope_for(
            kind,
            principal,
            project_filter,
        );
        log_phase(LifecyclePhase::PreRead, kind, &result);
        result
    }

    /// Validates a batch of drafts and returns the records to persist.
    ///
    /// The whole batch is rejected on the first failing item. Owning projects
    /// are stamped only once every item has passed.
    pub fn pre_insert(
        &self,
        principal: &Principal,
        drafts: Vec<ResourceDraft>,
    ) -> Result<Vec<Resource>, LifecycleError> {
        let count = drafts.len();
        let result = self.run_pre_insert(principal, drafts);
        match &result {
            Ok(_) => info!(
                "event=lifecycle_hook module=hooks phase=pre_insert status=ok count={count}"
            ),
            Err(err) => warn!(
                "event=lifecycle_hook module=hooks phase=pre_insert status=error count={count} http_status={}",
                err.status().http_status()
            ),
        }
        result
    }

    /// Stamps `changes` and returns the updated record.
    pub fn pre_update(
        &self,
        principal: &Principal,
        prior: &Resource,
        changes: ResourceChanges,
    ) -> Result<Resource, LifecycleError> {
        let kind = prior.kind();
        let result = self.run_pre_update(principal, prior, changes);
        log_phase(LifecyclePhase::PreUpdate, kind, &result);
        result
    }

    /// Checks access for removing `item` and removes its dependents.
    ///
    /// The caller removes `item` itself once this returns `Ok`.
    pub fn pre_delete(
        &self,
        principal: &Principal,
        item: &Resource,
    ) -> Result<CascadeReport, LifecycleError> {
        let result = self.run_pre_delete(principal, item);
        log_phase(LifecyclePhase::PreDelete, item.kind(), &result);
        result
    }

    /// Places `code` in its project's code system under `parent`, or at root
    /// level when `None`.
    ///
    /// A code already in the tree moves with its subtree; otherwise a leaf is
    /// added. Returns the stamped project for the caller to persist.
    pub fn pre_place_code(
        &self,
        principal: &Principal,
        code: &Code,
        parent: Option<CodeId>,
        index: Option<usize>,
    ) -> Result<Project, LifecycleError> {
        let result = self.run_place_code(principal, code, parent, index);
        log_phase(LifecyclePhase::PreUpdate, ResourceKind::Code, &result);
        result
    }

    fn run_pre_insert(
        &self,
        principal: &Principal,
        drafts: Vec<ResourceDraft>,
    ) -> Result<Vec<Resource>, LifecycleError> {
        let now = self.clock.now_epoch_ms();
        let guard = ProjectAccessGuard::new(self.store);
        let mut new_project_names = BTreeSet::new();
        let mut touched_projects: Vec<ProjectId> = Vec::new();
        let mut records = Vec::with_capacity(drafts.len());

        for draft in drafts {
            if let Some(project) = draft.owning_project() {
                guard.require(project, principal, AccessLevel::Write)?;
                if !touched_projects.contains(&project) {
                    touched_projects.push(project);
                }
            }
            match &draft {
                ResourceDraft::Project(project) => {
                    let name = project.normalized_name()?;
                    let taken = self
                        .store
                        .find_project_by_owner_and_name(principal, &name)?
                        .is_some();
                    if taken || !new_project_names.insert(name.clone()) {
                        return Err(LifecycleError::Conflict { name });
                    }
                    if let Some(tree) = &project.code_system {
                        self.check_code_system(project.id, tree)?;
                    }
                }
                ResourceDraft::Document(document) => {
                    self.check_document_quotes(
                        document.id,
                        document.project,
                        &document.quotes,
                    )?;
                }
                ResourceDraft::Code(_) => {}
                ResourceDraft::Quote(quote) => self.check_quote_references(quote)?,
            }

            records.push(draft.into_resource(principal, now)?);
        }

        for project in touched_projects {
            self.store.stamp_project(project, principal, now)?;
        }
        Ok(records)
    }

    fn run_pre_update(
        &self,
        principal: &Principal,
        prior: &Resource,
        changes: ResourceChanges,
    ) -> Result<Resource, LifecycleError> {
        if changes.kind() != prior.kind() {
            return Err(LifecycleError::KindMismatch {
                expected: prior.kind(),
                actual: changes.kind(),
            });
        }

        let stamped = StampedChanges {
            changes,
            modified_by: principal.clone(),
            modified_at: self.clock.now_epoch_ms(),
        };

        match (prior, &stamped.changes) {
            (Resource::Project(project), ResourceChanges::Project(project_changes)) => {
                if self.config.guard_project_mutations {
                    self.require_write(project.id, principal)?;
                }
                if let Some(name) = &project_changes.name {
                    self.ensure_rename_is_unique(project, name)?;
                }
                if let Some(Some(tree)) = &project_changes.code_system {
                    self.check_code_system(project.id, tree)?;
                }
            }
            (Resource::Document(document), ResourceChanges::Document(document_changes)) => {
                self.require_write(document.project, principal)?;
                if let Some(quotes) = &document_changes.quotes {
                    self.check_document_quotes(document.id, document.project, quotes)?;
                }
            }
            (Resource::Quote(quote), ResourceChanges::Quote(quote_changes)) => {
                self.require_write(quote.project, principal)?;
                if let Some(Some(code)) = quote_changes.code {
                    self.check_code_reference(quote.project, code)?;
                }
            }
            _ => {
                self.require_write(prior.owning_project(), principal)?;
            }
        }

        let mut updated = prior.clone();
        if !stamped.apply_to(&mut updated)? {
            return Err(LifecycleError::KindMismatch {
                expected: prior.kind(),
                actual: stamped.changes.kind(),
            });
        }

        if prior.kind() != ResourceKind::Project {
            self.store.stamp_project(
                prior.owning_project(),
                &stamped.modified_by,
                stamped.modified_at,
            )?;
        }
        Ok(updated)
    }

    fn run_pre_delete(
        &self,
        principal: &Principal,
        item: &Resource,
    ) -> Result<CascadeReport, LifecycleError> {
        let now = self.clock.now_epoch_ms();
        if let Resource::Project(project) = item {
            if self.config.guard_project_mutations {
                self.require_write(project.id, principal)?;
            }
        } else {
            let project = item.owning_project();
            self.require_write(project, principal)?;
            self.store.stamp_project(project, principal, now)?;
        }

        let cascade = CascadeDeleteEngine::new(self.store, self.clock, self.config.code_removal);
        match item {
            Resource::Project(project) => cascade.delete_project(project),
            Resource::Document(document) => cascade.delete_document(document.id),
            Resource::Quote(quote) => cascade.delete_quote(quote),
            Resource::Code(code) => cascade.delete_code(code, principal),
        }
    }

    fn run_place_code(
        &self,
        principal: &Principal,
        code: &Code,
        parent: Option<CodeId>,
        index: Option<usize>,
    ) -> Result<Project, LifecycleError> {
        let mut project = self.require_write(code.project, principal)?;
        let tree = project.code_system.take().unwrap_or_default();
        let updated = if code_tree::locate(&tree, code.id).is_some() {
            code_tree::reparent(tree, code.id, parent, index)?
        } else {
            code_tree::insert_node(tree, parent, code.id, index)?
        };
        project.code_system = Some(updated);
        project.audit.touch(principal, self.clock.now_epoch_ms());
        Ok(project)
    }

    fn require_write(
        &self,
        project: ProjectId,
        principal: &Principal,
    ) -> Result<Project, LifecycleError> {
        ProjectAccessGuard::new(self.store).require(project, principal, AccessLevel::Write)
    }

    fn ensure_rename_is_unique(&self, project: &Project, name: &str) -> Result<(), LifecycleError> {
        let name = name.trim();
        if name == project.name {
            return Ok(());
        }
        match self
            .store
            .find_project_by_owner_and_name(&project.owner, name)?
        {
            Some(other) if other.id != project.id => Err(LifecycleError::Conflict {
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn check_quote_references(&self, quote: &QuoteDraft) -> Result<(), LifecycleError> {
        let document = self
            .store
            .get_document(quote.document)?
            .ok_or(LifecycleError::NotFound(ResourceRef::Document(quote.document)))?;
        if document.project != quote.project {
            return Err(ModelValidationError::ProjectMismatch {
                expected: quote.project,
                actual: document.project,
                field: "document",
            }
            .into());
        }
        if let Some(code) = quote.code {
            self.check_code_reference(quote.project, code)?;
        }
        Ok(())
    }

    fn check_document_quotes(
        &self,
        document: DocumentId,
        project: ProjectId,
        quotes: &[QuoteId],
    ) -> Result<(), LifecycleError> {
        for &id in quotes {
            let quote = self
                .store
                .get_quote(id)?
                .ok_or(LifecycleError::NotFound(ResourceRef::Quote(id)))?;
            if quote.project != project {
                return Err(ModelValidationError::ProjectMismatch {
                    expected: project,
                    actual: quote.project,
                    field: "quote",
                }
                .into());
            }
            if quote.document != document {
                return Err(ModelValidationError::QuoteOfOtherDocument {
                    quote: id,
                    document: quote.document,
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_code_system(
        &self,
        project: ProjectId,
        tree: &CodeSystem,
    ) -> Result<(), LifecycleError> {
        for code in tree.codes() {
            self.check_code_reference(project, code)?;
        }
        Ok(())
    }

    fn check_code_reference(&self, project: ProjectId, code: CodeId) -> Result<(), LifecycleError> {
        let stored = self
            .store
            .get_code(code)?
            .ok_or(LifecycleError::NotFound(ResourceRef::Code(code)))?;
        if stored.project != project {
            return Err(ModelValidationError::ProjectMismatch {
                expected: project,
                actual: stored.project,
                field: "code",
            }
            .into());
        }
        Ok(())
    }
}

fn log_phase<T>(phase: LifecyclePhase, kind: ResourceKind, result: &Result<T, LifecycleError>) {
    match result {
        Ok(_) => info!(
            "event=lifecycle_hook module=hooks phase={} kind={} status=ok",
            phase.as_str(),
            kind
        ),
        Err(err) => warn!(
            "event=lifecycle_hook module=hooks phase={} kind={} status=error http_status={}",
            phase.as_str(),
            kind,
            err.status().http_status()
        ),
    }
}
