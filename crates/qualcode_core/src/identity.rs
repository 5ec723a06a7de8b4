//! Credential parsing and principal resolution.
//!
//! # Responsibility
//! - Extract a bearer token from the raw `Authorization` header.
//! - Define the resolver seam to the external identity provider.
//!
//! # Invariants
//! - Resolution either yields a valid `Principal` or an `AuthError`; no
//!   resource is touched before it succeeds.

use crate::model::principal::Principal;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw inbound credential as received with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    authorization: Option<String>,
}

impl Credential {
    /// Wraps the value of the `Authorization` header, if the request had one.
    pub fn from_authorization_header(value: Option<&str>) -> Self {
        Self {
            authorization: value.map(str::to_string),
        }
    }

    /// Credential carrying `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the bearer token.
    ///
    /// # Errors
    /// - `MissingHeader` when no header was sent.
    /// - `InvalidHeader` when the scheme is not `Bearer` or the token part is
    ///   missing or followed by extra parts.
    pub fn bearer_token(&self) -> Result<&str, AuthError> {
        let header = self
            .authorization
            .as_deref()
            .ok_or(AuthError::MissingHeader)?;
        let mut parts = header.split_whitespace();
        let scheme = parts.next().ok_or(AuthError::MissingHeader)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::InvalidHeader(
                "authorization header must start with Bearer",
            ));
        }
        let token = parts
            .next()
            .ok_or(AuthError::InvalidHeader("token not found"))?;
        if parts.next().is_some() {
            return Err(AuthError::InvalidHeader(
                "authorization header must be Bearer token",
            ));
        }
        Ok(token)
    }
}

/// Authentication failures. Surface as HTTP 401-equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader(&'static str),
    /// Token is well-formed but the provider does not recognize it.
    UnknownToken,
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::InvalidHeader(_) => "invalid_header",
            Self::UnknownToken => "invalid_token",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "authorization header is expected"),
            Self::InvalidHeader(details) => write!(f, "{details}"),
            Self::UnknownToken => write!(f, "token is not recognized"),
        }
    }
}

impl Error for AuthError {}

/// Seam to the external identity provider.
pub trait IdentityResolver {
    fn resolve_principal(&self, credential: &Credential) -> Result<Principal, AuthError>;
}

/// Token table resolver for tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    tokens: BTreeMap<String, Principal>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve_principal(&self, credential: &Credential) -> Result<Principal, AuthError> {
        let token = credential.bearer_token()?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::UnknownToken)
    }
}
