//! Caller identity value type.
//!
//! # Invariants
//! - A `Principal` is trimmed, non-empty and shaped like `local@domain`.
//! - Comparison is exact; no case folding is applied.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static PRINCIPAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid principal regex"));

/// Resolved identity (email) of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Parses and normalizes one principal value.
    pub fn parse(value: &str) -> Result<Self, PrincipalError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PrincipalError::Empty);
        }
        if !PRINCIPAL_RE.is_match(trimmed) {
            return Err(PrincipalError::Malformed(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

/// Principal parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    Empty,
    Malformed(String),
}

impl Display for PrincipalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "principal must not be empty"),
            Self::Malformed(value) => write!(f, "principal is not an email address: `{value}`"),
        }
    }
}

impl Error for PrincipalError {}
