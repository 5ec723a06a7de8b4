//! Access gate in front of the analytics procedures.
//!
//! The procedures themselves (co-occurrence matrix, code import) live outside
//! this crate; only their contract is defined here.

use crate::identity::{Credential, IdentityResolver};
use crate::model::code::CodeId;
use crate::model::principal::Principal;
use crate::model::project::ProjectId;
use crate::repo::ProjectRepository;
use crate::service::access_guard::{AccessLevel, ProjectAccessGuard};
use crate::service::error::LifecycleError;
use log::{info, warn};

/// Unit counted when two codes co-occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooccurrenceMode {
    /// Codes applied to overlapping quotes.
    Quote,
    /// Codes applied anywhere in the same document.
    Document,
}

/// Square code-by-code count matrix; `counts[i][j]` pairs `codes[i]` with `codes[j]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMatrix {
    pub codes: Vec<CodeId>,
    pub counts: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CooccurrenceOutcome {
    Matrix(CodeMatrix),
    /// The procedure could not compute a matrix and explains why.
    Failed { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported_codes: Vec<CodeId>,
}

/// External analytics procedures.
pub trait AnalyticsProcedures {
    fn compute_code_cooccurrence(
        &self,
        project: ProjectId,
        mode: CooccurrenceMode,
    ) -> CooccurrenceOutcome;

    fn import_codes(
        &self,
        from: ProjectId,
        to: ProjectId,
        principal: &Principal,
    ) -> ImportSummary;
}

pub struct AnalyticsGate<'s, S: ?Sized, R: ?Sized, A: ?Sized> {
    store: &'s S,
    resolver: &'s R,
    procedures: &'s A,
}

impl<'s, S, R, A> AnalyticsGate<'s, S, R, A>
where
    S: ProjectRepository + ?Sized,
    R: IdentityResolver + ?Sized,
    A: AnalyticsProcedures + ?Sized,
{
    pub fn new(store: &'s S, resolver: &'s R, procedures: &'s A) -> Self {
        Self {
            store,
            resolver,
            procedures,
        }
    }

    /// Co-occurrence matrix of `project`. Requires read access.
    ///
    /// A `Failed` outcome becomes `AnalyticsFailure` carrying its message.
    pub fn code_cooccurrence(
        &self,
        credential: &Credential,
        project: ProjectId,
        mode: CooccurrenceMode,
    ) -> Result<CodeMatrix, LifecycleError> {
        let principal = self.resolver.resolve_principal(credential)?;
        ProjectAccessGuard::new(self.store).require(project, &principal, AccessLevel::Read)?;

        match self.procedures.compute_code_cooccurrence(project, mode) {
            CooccurrenceOutcome::Matrix(matrix) => {
                info!(
                    "event=code_cooccurrence module=analytics status=ok project={} codes={}",
                    project,
                    matrix.codes.len()
                );
                Ok(matrix)
            }
            CooccurrenceOutcome::Failed { message } => {
                warn!(
                    "event=code_cooccurrence module=analytics status=error project={}",
                    project
                );
                Err(LifecycleError::AnalyticsFailure(message))
            }
        }
    }

    /// Copies the code system of `from` into `to`.
    ///
    /// Write access on `to` is checked before read access on `from`.
    pub fn import_codes(
        &self,
        credential: &Credential,
        from: ProjectId,
        to: ProjectId,
    ) -> Result<ImportSummary, LifecycleError> {
        let principal = self.resolver.resolve_principal(credential)?;
        let guard = ProjectAccessGuard::new(self.store);
        guard.require(to, &principal, AccessLevel::Write)?;
        guard.require(from, &principal, AccessLevel::Read)?;

        let summary = self.procedures.import_codes(from, to, &principal);
        info!(
            "event=import_codes module=analytics status=ok from={} to={} imported={}",
            from,
            to,
            summary.imported_codes.len()
        );
        Ok(summary)
    }
}
