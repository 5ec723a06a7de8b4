//! Request-level entry points over the resource store.
//!
//! # Responsibility
//! - Resolve the caller from the request credential.
//! - Load prior state, run the lifecycle hooks and persist their output.
//! - Group each write request into one store unit when configured.
//!
//! # Invariants
//! - Nothing is read or written before the credential resolves.
//! - Hooks run before the store write they guard.
//! - A deleted record is removed only after its cascade succeeded.

use crate::clock::Clock;
use crate::config::{CoreConfig, UnfilteredListPolicy};
use crate::identity::{Credential, IdentityResolver};
use crate::model::code::{Code, CodeId};
use crate::model::document::Document;
use crate::model::principal::Principal;
use crate::model::project::{Project, ProjectId};
use crate::model::quote::Quote;
use crate::model::resource::{Resource, ResourceChanges, ResourceDraft, ResourceKind, ResourceRef};
use crate::repo::{run_in_unit, QuoteFilter, ResourceStore};
use crate::service::access_guard::{AccessLevel, ProjectAccessGuard};
use crate::service::cascade::CascadeReport;
use crate::service::error::LifecycleError;
use crate::service::hooks::LifecycleHookEngine;
use log::{debug, info};

pub struct ResourceService<'s, S: ?Sized, R: ?Sized, C: ?Sized> {
    store: &'s S,
    resolver: &'s R,
    clock: &'s C,
    config: CoreConfig,
}

impl<'s, S, R, C> ResourceService<'s, S, R, C>
where
    S: ResourceStore + ?Sized,
    R: IdentityResolver + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'s S, resolver: &'s R, clock: &'s C, config: CoreConfig) -> Self {
        Self {
            store,
            resolver,
            clock,
            config,
        }
    }

    /// Resolves the caller. Always the first step of a request.
    pub fn authenticate(&self, credential: &Credential) -> Result<Principal, LifecycleError> {
        self.resolver
            .resolve_principal(credential)
            .map_err(LifecycleError::from)
    }

    /// Projects owned by or shared with the caller.
    pub fn list_projects(&self, credential: &Credential) -> Result<Vec<Project>, LifecycleError> {
        let principal = self.authenticate(credential)?;
        let scope = self
            .hooks()
            .pre_read(&principal, ResourceKind::Project, None)?;
        Ok(self.store.list_projects(&scope)?)
    }

    pub fn list_documents(
        &self,
        credential: &Credential,
        project: Option<ProjectId>,
    ) -> Result<Vec<Document>, LifecycleError> {
        let principal = self.authenticate(credential)?;
        let scope = self
            .hooks()
            .pre_read(&principal, ResourceKind::Document, project)?;
        Ok(self.store.list_documents(&scope)?)
    }

    pub fn list_quotes(
        &self,
        credential: &Credential,
        project: Option<ProjectId>,
        filter: &QuoteFilter,
    ) -> Result<Vec<Quote>, LifecycleError> {
        let principal = self.authenticate(credential)?;
        let scope = self
            .hooks()
            .pre_read(&principal, ResourceKind::Quote, project)?;
        Ok(self.store.list_quotes(&scope, filter)?)
    }

    pub fn list_codes(
        &self,
        credential: &Credential,
        project: Option<ProjectId>,
    ) -> Result<Vec<Code>, LifecycleError> {
        let principal = self.authenticate(credential)?;
        let scope = self
            .hooks()
            .pre_read(&principal, ResourceKind::Code, project)?;
        Ok(self.store.list_codes(&scope)?)
    }

    /// Reads one record.
    ///
    /// A project the caller cannot see reads as `NotFound`. Other records
    /// follow `UnfilteredListPolicy`: unrestricted under `Passthrough`, read
    /// access on the owning project otherwise.
    pub fn get(
        &self,
        credential: &Credential,
        target: ResourceRef,
    ) -> Result<Resource, LifecycleError> {
        let principal = self.authenticate(credential)?;
        let resource = self.load(target)?;
        match &resource {
            Resource::Project(project) => {
                if !project.is_visible_to(&principal) {
                    return Err(LifecycleError::NotFound(target));
                }
            }
            Resource::Document(_) | Resource::Quote(_) | Resource::Code(_) => {
                if self.config.unfiltered_lists == UnfilteredListPolicy::RestrictToVisibleProjects
                {
                    ProjectAccessGuard::new(self.store).require(
                        resource.owning_project(),
                        &principal,
                        AccessLevel::Read,
                    )?;
                }
            }
        }
        Ok(resource)
    }

    /// Inserts a batch of new records. Either every record is stored or none.
    pub fn insert(
        &self,
        credential: &Credential,
        drafts: Vec<ResourceDraft>,
    ) -> Result<Vec<Resource>, LifecycleError> {
        let principal = self.authenticate(credential)?;
        self.write_unit(|| {
            let records = self.hooks().pre_insert(&principal, drafts)?;
            for record in &records {
                self.persist_new(record)?;
            }
            Ok(records)
        })
    }

    /// Applies `changes` to the record at `target`.
    pub fn update(
        &self,
        credential: &Credential,
        target: ResourceRef,
        changes: ResourceChanges,
    ) -> Result<Resource, LifecycleError> {
        let principal = self.authenticate(credential)?;
        self.write_unit(|| {
            let prior = self.load(target)?;
            let updated = self.hooks().pre_update(&principal, &prior, changes)?;
            let stored = match &updated {
                Resource::Project(project) => self.store.update_project(project)?,
                Resource::Document(document) => self.store.update_document(document)?,
                Resource::Quote(quote) => self.store.update_quote(quote)?,
                Resource::Code(code) => self.store.update_code(code)?,
            };
            if !stored {
                return Err(LifecycleError::NotFound(target));
            }
            Ok(updated)
        })
    }

    /// Deletes the record at `target` together with its dependents.
    pub fn delete(
        &self,
        credential: &Credential,
        target: ResourceRef,
    ) -> Result<CascadeReport, LifecycleError> {
        let principal = self.authenticate(credential)?;
        self.write_unit(|| {
            let item = self.load(target)?;
            let mut report = self.hooks().pre_delete(&principal, &item)?;
            // The document cascade already removed the row itself.
            let removed = match target {
                ResourceRef::Project(id) => self.store.remove_project(id)?,
                ResourceRef::Document(id) => self.store.remove_document(id)?,
                ResourceRef::Quote(_) => false,
                ResourceRef::Code(id) => self.store.remove_code(id)?,
            };
            if removed {
                match target {
                    ResourceRef::Document(id) => report.documents.push(id),
                    ResourceRef::Code(id) => report.codes.push(id),
                    ResourceRef::Project(_) | ResourceRef::Quote(_) => {}
                }
            }
            info!(
                "event=resource_delete module=resource status=ok kind={} documents={} quotes={} codes={}",
                target.kind(),
                report.documents.len(),
                report.quotes.len(),
                report.codes.len()
            );
            Ok(report)
        })
    }

    /// Places `code` in its project's code system under `parent` (root level
    /// when `None`) at `index` among the siblings, appending when `None`.
    pub fn place_code(
        &self,
        credential: &Credential,
        code: CodeId,
        parent: Option<CodeId>,
        index: Option<usize>,
    ) -> Result<Project, LifecycleError> {
        let principal = self.authenticate(credential)?;
        self.write_unit(|| {
            let code = self
                .store
                .get_code(code)?
                .ok_or(LifecycleError::NotFound(ResourceRef::Code(code)))?;
            let project = self
                .hooks()
                .pre_place_code(&principal, &code, parent, index)?;
            if !self.store.update_project(&project)? {
                return Err(LifecycleError::NotFound(ResourceRef::Project(project.id)));
            }
            Ok(project)
        })
    }

    fn hooks(&self) -> LifecycleHookEngine<'s, S, C> {
        LifecycleHookEngine::new(self.store, self.clock, self.config)
    }

    fn load(&self, target: ResourceRef) -> Result<Resource, LifecycleError> {
        let loaded = match target {
            ResourceRef::Project(id) => self.store.get_project(id)?.map(Resource::Project),
            ResourceRef::Document(id) => self.store.get_document(id)?.map(Resource::Document),
            ResourceRef::Quote(id) => self.store.get_quote(id)?.map(Resource::Quote),
            ResourceRef::Code(id) => self.store.get_code(id)?.map(Resource::Code),
        };
        loaded.ok_or(LifecycleError::NotFound(target))
    }

    fn persist_new(&self, record: &Resource) -> Result<(), LifecycleError> {
        match record {
            Resource::Project(project) => self.store.insert_project(project)?,
            Resource::Document(document) => self.store.insert_document(document)?,
            Resource::Quote(quote) => {
                self.store.insert_quote(quote)?;
                self.attach_to_document(quote)?;
            }
            Resource::Code(code) => self.store.insert_code(code)?,
        }
        debug!(
            "event=resource_insert module=resource status=ok kind={} id={}",
            record.kind(),
            record.reference().id()
        );
        Ok(())
    }

    fn attach_to_document(&self, quote: &Quote) -> Result<(), LifecycleError> {
        let mut document = self
            .store
            .get_document(quote.document)?
            .ok_or(LifecycleError::NotFound(ResourceRef::Document(quote.document)))?;
        if !document.quotes.contains(&quote.id) {
            document.quotes.push(quote.id);
            self.store.update_document(&document)?;
        }
        Ok(())
    }

    fn write_unit<T>(
        &self,
        f: impl FnOnce() -> Result<T, LifecycleError>,
    ) -> Result<T, LifecycleError> {
        if self.config.transactional_writes {
            run_in_unit(self.store, f)
        } else {
            f()
        }
    }
}
