//! Scope filter: narrows list queries to rows the caller may see.
//!
//! # Invariants
//! - Project lists only contain projects owned by or shared with the caller.
//! - A list that names a project fails closed (`Forbidden`) when the caller
//!   cannot read it; it never degrades to an empty result.
//! - Lists that name no project follow `UnfilteredListPolicy`.

use crate::config::UnfilteredListPolicy;
use crate::model::principal::Principal;
use crate::model::project::ProjectId;
use crate::model::resource::ResourceKind;
use crate::model::scope::ScopePredicate;
use crate::repo::ProjectRepository;
use crate::service::access_guard::{AccessLevel, ProjectAccessGuard};
use crate::service::error::LifecycleError;
use log::debug;

pub struct ScopeFilter<'s, S: ?Sized> {
    store: &'s S,
    unfiltered: UnfilteredListPolicy,
}

impl<'s, S: ProjectRepository + ?Sized> ScopeFilter<'s, S> {
    pub fn new(store: &'s S, unfiltered: UnfilteredListPolicy) -> Self {
        Self { store, unfiltered }
    }

    /// Returns the predicate for listing `kind` on behalf of `principal`.
    ///
    /// `project_filter` is the project explicitly named by the request. It is
    /// ignored for project lists, where visibility alone decides.
    pub fn scope_for(
        &self,
        kind: ResourceKind,
        principal: &Principal,
        project_filter: Option<ProjectId>,
    ) -> Result<ScopePredicate, LifecycleError> {
        let scope = match (kind, project_filter) {
            (ResourceKind::Project, _) => ScopePredicate::VisibleTo(principal.clone()),
            (ResourceKind::Document | ResourceKind::Quote | ResourceKind::Code, Some(project)) => {
                ProjectAccessGuard::new(self.store).require(project, principal, AccessLevel::Read)?;
                ScopePredicate::InProject(project)
            }
            (ResourceKind::Document | ResourceKind::Quote | ResourceKind::Code, None) => {
                match self.unfiltered {
                    UnfilteredListPolicy::Passthrough => ScopePredicate::Unrestricted,
                    UnfilteredListPolicy::RestrictToVisibleProjects => {
                        ScopePredicate::VisibleTo(principal.clone())
                    }
                }
            }
        };
        debug!(
            "event=scope_filter module=scope status=ok kind={} filtered={}",
            kind,
            project_filter.is_some()
        );
        Ok(scope)
    }
}
