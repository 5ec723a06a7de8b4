//! Errors surfaced by the authorization and lifecycle layer.

use crate::identity::AuthError;
use crate::model::project::ProjectId;
use crate::model::resource::{ResourceKind, ResourceRef};
use crate::model::validation::ModelValidationError;
use crate::repo::RepoError;
use crate::service::code_tree::CodeTreeError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const INSUFFICIENT_PRIVILEGES: &str = "insufficient privileges";
pub const NAME_NOT_UNIQUE: &str = "name is not unique for this user";

/// Status class of a failure, with its HTTP-equivalent code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    Unauthorized,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    /// The analytics procedure reported that it could not compute a result.
    AnalyticsFailure,
    Internal,
}

impl ErrorStatus {
    pub fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 422,
            Self::AnalyticsFailure => 449,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug)]
pub enum LifecycleError {
    /// Credential missing or not recognized.
    Authentication(AuthError),
    /// Referenced record does not exist.
    NotFound(ResourceRef),
    /// Principal lacks the required access on the project.
    Forbidden { project: ProjectId },
    /// `(owner, name)` already taken.
    Conflict { name: String },
    /// Record input fails model validation.
    Invalid(ModelValidationError),
    /// A code system move or insert would break the tree.
    Tree(CodeTreeError),
    /// Change set kind does not match the target record.
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },
    /// A cascade step failed after earlier steps may have been applied.
    Cascade {
        step: &'static str,
        source: RepoError,
    },
    Repo(RepoError),
    AnalyticsFailure(String),
}

impl LifecycleError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            Self::Authentication(_) => ErrorStatus::Unauthorized,
            Self::NotFound(_) => ErrorStatus::NotFound,
            Self::Forbidden { .. } => ErrorStatus::Forbidden,
            Self::Conflict { .. } => ErrorStatus::Conflict,
            Self::Invalid(_) | Self::Tree(_) | Self::KindMismatch { .. } => {
                ErrorStatus::BadRequest
            }
            Self::Cascade { .. } | Self::Repo(_) => ErrorStatus::Internal,
            Self::AnalyticsFailure(_) => ErrorStatus::AnalyticsFailure,
        }
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication(err) => write!(f, "{err}"),
            Self::NotFound(target) => write!(f, "{target} not found"),
            Self::Forbidden { .. } => f.write_str(INSUFFICIENT_PRIVILEGES),
            Self::Conflict { .. } => f.write_str(NAME_NOT_UNIQUE),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::KindMismatch { expected, actual } => {
                write!(f, "{actual} changes cannot be applied to a {expected}")
            }
            Self::Cascade { step, source } => write!(f, "cascade step `{step}` failed: {source}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::AnalyticsFailure(message) => f.write_str(message),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Authentication(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::Cascade { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuthError> for LifecycleError {
    fn from(value: AuthError) -> Self {
        Self::Authentication(value)
    }
}

impl From<ModelValidationError> for LifecycleError {
    fn from(value: ModelValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<CodeTreeError> for LifecycleError {
    fn from(value: CodeTreeError) -> Self {
        match value {
            CodeTreeError::NodeNotFound(code) | CodeTreeError::ParentNotFound(code) => {
                Self::NotFound(ResourceRef::Code(code))
            }
            other => Self::Tree(other),
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorStatus, LifecycleError};
    use crate::model::resource::ResourceRef;
    use crate::service::code_tree::CodeTreeError;
    use uuid::Uuid;

    #[test]
    fn forbidden_and_conflict_use_user_facing_messages() {
        let forbidden = LifecycleError::Forbidden {
            project: Uuid::new_v4(),
        };
        assert_eq!(forbidden.to_string(), "insufficient privileges");
        assert_eq!(forbidden.status().http_status(), 403);

        let conflict = LifecycleError::Conflict {
            name: "Study1".to_string(),
        };
        assert_eq!(conflict.to_string(), "name is not unique for this user");
        assert_eq!(conflict.status(), ErrorStatus::Conflict);
    }

    #[test]
    fn analytics_failure_has_distinguished_status() {
        let err = LifecycleError::AnalyticsFailure("no quotes".to_string());
        assert_eq!(err.status().http_status(), 449);
        assert_eq!(err.to_string(), "no quotes");
    }

    #[test]
    fn tree_errors_split_into_not_found_and_bad_request() {
        let parent = Uuid::new_v4();
        let err = LifecycleError::from(CodeTreeError::ParentNotFound(parent));
        assert!(matches!(err, LifecycleError::NotFound(ResourceRef::Code(id)) if id == parent));

        let code = Uuid::new_v4();
        let err = LifecycleError::from(CodeTreeError::CycleDetected { code, parent });
        assert_eq!(err.status(), ErrorStatus::BadRequest);
    }
}
