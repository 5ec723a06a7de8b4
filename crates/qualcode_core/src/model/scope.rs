//! Row-visibility predicates produced by the scope filter and honored by stores.

use crate::model::principal::Principal;
use crate::model::project::ProjectId;

/// Restriction applied to a list query before it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePredicate {
    /// Rows whose project is owned by, or lists as collaborator, the principal.
    VisibleTo(Principal),
    /// Rows of exactly one project.
    InProject(ProjectId),
    /// No restriction.
    Unrestricted,
}
