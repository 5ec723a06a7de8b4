//! Cascade delete engine.
//!
//! # Responsibility
//! - Remove the dependents of a project, document or code before the record
//!   itself is removed.
//! - Keep the owning project's code system in sync on code deletion.
//!
//! # Invariants
//! - Dependents are removed before their parent; a missing dependent is skipped.
//! - Project cascades remove codes directly: their tree nodes and quotes are
//!   left untouched on that path.
//! - Steps are not rolled back here; atomicity comes from the caller's unit.

use crate::clock::Clock;
use crate::config::CodeRemovalMode;
use crate::model::code::{Code, CodeId};
use crate::model::document::DocumentId;
use crate::model::principal::Principal;
use crate::model::project::Project;
use crate::model::quote::{Quote, QuoteId};
use crate::model::scope::ScopePredicate;
use crate::repo::{QuoteFilter, RepoError, ResourceStore};
use crate::service::code_tree;
use crate::service::error::LifecycleError;
use log::{debug, info};

/// Records removed by one cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub documents: Vec<DocumentId>,
    pub quotes: Vec<QuoteId>,
    pub codes: Vec<CodeId>,
    /// Whether a node was removed from a code system.
    pub tree_node_removed: bool,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
            && self.quotes.is_empty()
            && self.codes.is_empty()
            && !self.tree_node_removed
    }
}

pub struct CascadeDeleteEngine<'s, S: ?Sized, C: ?Sized> {
    store: &'s S,
    clock: &'s C,
    code_removal: CodeRemovalMode,
}

impl<'s, S, C> CascadeDeleteEngine<'s, S, C>
where
    S: ResourceStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'s S, clock: &'s C, code_removal: CodeRemovalMode) -> Self {
        Self {
            store,
            clock,
            code_removal,
        }
    }

    /// Removes every document (with its quotes) and every code of `project`.
    ///
    /// The project row itself is left to the caller.
    pub fn delete_project(&self, project: &Project) -> Result<CascadeReport, LifecycleError> {
        let mut report = CascadeReport::default();
        let scope = ScopePredicate::InProject(project.id);

        let documents = self
            .store
            .list_documents(&scope)
            .map_err(step("list_project_documents"))?;
        for document in documents {
            self.remove_document(document.id, &mut report)?;
        }

        let codes = self
            .store
            .list_codes(&scope)
            .map_err(step("list_project_codes"))?;
        for code in codes {
            if self
                .store
                .remove_code(code.id)
                .map_err(step("remove_project_code"))?
            {
                report.codes.push(code.id);
            }
        }

        info!(
            "event=cascade_delete module=cascade status=ok kind=project id={} documents={} quotes={} codes={}",
            project.id,
            report.documents.len(),
            report.quotes.len(),
            report.codes.len()
        );
        Ok(report)
    }

    /// Removes the listed quotes extracted from `document`, then the document row.
    pub fn delete_document(&self, document: DocumentId) -> Result<CascadeReport, LifecycleError> {
        let mut report = CascadeReport::default();
        self.remove_document(document, &mut report)?;
        info!(
            "event=cascade_delete module=cascade status=ok kind=document id={} quotes={}",
            document,
            report.quotes.len()
        );
        Ok(report)
    }

    /// Prunes `code` from its project's code system, then removes its quotes.
    ///
    /// The code row itself is left to the caller. Under `Prune`, descendant
    /// codes dropped from the tree are removed here along with their quotes.
    pub fn delete_code(
        &self,
        code: &Code,
        principal: &Principal,
    ) -> Result<CascadeReport, LifecycleError> {
        let mut report = CascadeReport::default();

        let project = self
            .store
            .get_project(code.project)
            .map_err(step("load_code_project"))?;
        if let Some(mut project) = project {
            if let Some(tree) = project.code_system.take() {
                let (updated, removal) = code_tree::remove_node(tree, code.id, self.code_removal);
                project.code_system = Some(updated);
                project.audit.touch(principal, self.clock.now_epoch_ms());
                self.store
                    .update_project(&project)
                    .map_err(step("save_code_system"))?;
                report.tree_node_removed = removal.removed;

                for pruned in removal.pruned {
                    self.remove_quotes_of_code(pruned, &mut report)?;
                    if self
                        .store
                        .remove_code(pruned)
                        .map_err(step("remove_pruned_code"))?
                    {
                        report.codes.push(pruned);
                    }
                }
            }
        }

        self.remove_quotes_of_code(code.id, &mut report)?;
        info!(
            "event=cascade_delete module=cascade status=ok kind=code id={} tree_node_removed={} quotes={} codes={}",
            code.id,
            report.tree_node_removed,
            report.quotes.len(),
            report.codes.len()
        );
        Ok(report)
    }

    /// Removes one quote and drops it from its document's quote list.
    pub fn delete_quote(&self, quote: &Quote) -> Result<CascadeReport, LifecycleError> {
        let mut report = CascadeReport::default();
        self.detach_from_document(quote)?;
        if self
            .store
            .remove_quote(quote.id)
            .map_err(step("remove_quote"))?
        {
            report.quotes.push(quote.id);
        }
        Ok(report)
    }

    fn remove_document(
        &self,
        document: DocumentId,
        report: &mut CascadeReport,
    ) -> Result<(), LifecycleError> {
        // Re-read so quotes attached since the caller loaded the row are included.
        let Some(stored) = self
            .store
            .get_document(document)
            .map_err(step("load_document"))?
        else {
            return Ok(());
        };

        for &id in &stored.quotes {
            let quote = self
                .store
                .get_quote(id)
                .map_err(step("load_document_quote"))?;
            // Only quotes extracted from this document go with it.
            if !quote.is_some_and(|quote| quote.document == document) {
                continue;
            }
            if self
                .store
                .remove_quote(id)
                .map_err(step("remove_document_quote"))?
            {
                report.quotes.push(id);
            }
        }
        if self
            .store
            .remove_document(document)
            .map_err(step("remove_document"))?
        {
            report.documents.push(document);
        }
        debug!(
            "event=document_removed module=cascade status=ok id={} quotes={}",
            document,
            stored.quotes.len()
        );
        Ok(())
    }

    fn remove_quotes_of_code(
        &self,
        code: CodeId,
        report: &mut CascadeReport,
    ) -> Result<(), LifecycleError> {
        let quotes = self
            .store
            .list_quotes(&ScopePredicate::Unrestricted, &QuoteFilter::by_code(code))
            .map_err(step("list_code_quotes"))?;
        for quote in quotes {
            self.detach_from_document(&quote)?;
            if self
                .store
                .remove_quote(quote.id)
                .map_err(step("remove_code_quote"))?
            {
                report.quotes.push(quote.id);
            }
        }
        Ok(())
    }

    fn detach_from_document(&self, quote: &Quote) -> Result<(), LifecycleError> {
        let Some(mut document) = self
            .store
            .get_document(quote.document)
            .map_err(step("load_quote_document"))?
        else {
            return Ok(());
        };
        let before = document.quotes.len();
        document.quotes.retain(|id| *id != quote.id);
        if document.quotes.len() != before {
            self.store
                .update_document(&document)
                .map_err(step("detach_quote"))?;
        }
        Ok(())
    }
}

fn step(name: &'static str) -> impl Fn(RepoError) -> LifecycleError {
    move |source| LifecycleError::Cascade { step: name, source }
}
