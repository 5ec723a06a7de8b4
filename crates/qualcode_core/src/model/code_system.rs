//! Code system tree embedded in a project.
//!
//! Nodes only reference codes by id; code records live in their own collection.

use crate::model::code::CodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One node of a code system tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNode {
    pub code: CodeId,
    #[serde(default)]
    pub children: Vec<CodeNode>,
}

impl CodeNode {
    pub fn leaf(code: CodeId) -> Self {
        Self {
            code,
            children: Vec::new(),
        }
    }

    pub fn with_children(code: CodeId, children: Vec<CodeNode>) -> Self {
        Self { code, children }
    }
}

/// Ordered forest of root-level code nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeSystem {
    pub roots: Vec<CodeNode>,
}

impl CodeSystem {
    pub fn new(roots: Vec<CodeNode>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Returns every code id in depth-first pre-order.
    pub fn codes(&self) -> Vec<CodeId> {
        let mut out = Vec::new();
        collect_codes(&self.roots, &mut out);
        out
    }

    pub fn contains(&self, code: CodeId) -> bool {
        self.codes().contains(&code)
    }

    /// First code id carried by more than one node, in pre-order.
    pub fn first_duplicate(&self) -> Option<CodeId> {
        let mut seen = BTreeSet::new();
        self.codes().into_iter().find(|code| !seen.insert(*code))
    }
}

pub(crate) fn collect_codes(nodes: &[CodeNode], out: &mut Vec<CodeId>) {
    for node in nodes {
        out.push(node.code);
        collect_codes(&node.children, out);
    }
}
