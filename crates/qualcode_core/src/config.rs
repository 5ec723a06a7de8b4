//! Behavior switches for the authorization and cascade core.
//!
//! # Invariants
//! - Defaults reproduce the reference behavior, except that request writes
//!   run inside a store unit.
//! - Unknown JSON keys are rejected.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What happens to the children of a code node removed from a code system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeRemovalMode {
    /// Children take the removed node's place in its parent, in order.
    #[default]
    Promote,
    /// The whole subtree is dropped; descendant codes are deleted as well.
    Prune,
}

/// Handling of document/quote/code lists that name no project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfilteredListPolicy {
    /// No per-project check; rows are returned unrestricted.
    #[default]
    Passthrough,
    /// Rows are restricted to projects visible to the caller.
    RestrictToVisibleProjects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub code_removal: CodeRemovalMode,
    /// Wrap each insert/update/delete request in one store unit.
    pub transactional_writes: bool,
    pub unfiltered_lists: UnfilteredListPolicy,
    /// Require write access on a project to update or delete the project itself.
    pub guard_project_mutations: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            code_removal: CodeRemovalMode::Promote,
            transactional_writes: true,
            unfiltered_lists: UnfilteredListPolicy::Passthrough,
            guard_project_mutations: false,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON config document. Missing keys keep their defaults.
    pub fn from_json_str(value: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(value).map_err(ConfigError::Parse)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid core config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
        }
    }
}
