//! Audit attributes stamped on every stored record.

use crate::model::principal::Principal;
use serde::{Deserialize, Serialize};

/// Who created a record, who touched it last and when (epoch ms).
///
/// No creation timestamp is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_by: Principal,
    pub modified_by: Principal,
    pub modified_at: i64,
}

impl AuditFields {
    /// Audit fields for a record created by `principal` at `now`.
    pub fn created(principal: &Principal, now: i64) -> Self {
        Self {
            created_by: principal.clone(),
            modified_by: principal.clone(),
            modified_at: now,
        }
    }

    /// Records one modification.
    pub fn touch(&mut self, principal: &Principal, now: i64) {
        self.modified_by = principal.clone();
        self.modified_at = now;
    }
}
