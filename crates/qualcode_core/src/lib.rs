//! Authorization and consistency core for collaborative qualitative coding.
//! This crate is the single source of truth for access rules and cascades.

pub mod clock;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use config::{CodeRemovalMode, ConfigError, CoreConfig, UnfilteredListPolicy};
pub use identity::{AuthError, Credential, IdentityResolver, StaticIdentityResolver};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::code::{Code, CodeChanges, CodeDraft, CodeId};
pub use model::code_system::{CodeNode, CodeSystem};
pub use model::document::{Document, DocumentChanges, DocumentDraft, DocumentId};
pub use model::principal::{Principal, PrincipalError};
pub use model::project::{
    Collaborator, CollaboratorRole, Project, ProjectChanges, ProjectDraft, ProjectId,
};
pub use model::quote::{Quote, QuoteChanges, QuoteDraft, QuoteId};
pub use model::resource::{Resource, ResourceChanges, ResourceDraft, ResourceKind, ResourceRef};
pub use model::scope::ScopePredicate;
pub use model::validation::ModelValidationError;
pub use repo::{
    CodeRepository, DocumentRepository, ProjectRepository, QuoteFilter, QuoteRepository,
    RepoError, RepoResult, ResourceStore, SqliteStore,
};
pub use service::access_guard::{AccessDecision, AccessLevel, ProjectAccessGuard};
pub use service::analytics::{
    AnalyticsGate, AnalyticsProcedures, CodeMatrix, CooccurrenceMode, CooccurrenceOutcome,
    ImportSummary,
};
pub use service::cascade::{CascadeDeleteEngine, CascadeReport};
pub use service::code_tree::{CodeLocation, CodeRemoval, CodeTreeError};
pub use service::error::{ErrorStatus, LifecycleError};
pub use service::hooks::{LifecycleHookEngine, LifecyclePhase};
pub use service::resource_service::ResourceService;
pub use service::scope_filter::ScopeFilter;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
