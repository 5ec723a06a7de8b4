//! Code tree operations over a project's embedded code system.
//!
//! # Responsibility
//! - Locate, insert, move and remove code nodes.
//! - Apply the configured children policy when a node is removed.
//!
//! # Invariants
//! - Operations are pure: they take a tree by value and return the new tree.
//! - Stored trees carry a code id at most once; `insert_node` keeps it so and
//!   `remove_node` drops every match regardless.
//! - Moves never place a node under itself or one of its descendants.

use crate::config::CodeRemovalMode;
use crate::model::code::CodeId;
use crate::model::code_system::{collect_codes, CodeNode, CodeSystem};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Position of one node inside a code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLocation {
    /// `None` for root-level nodes.
    pub parent: Option<CodeId>,
    /// Index among its siblings.
    pub index: usize,
    /// Root-level nodes have depth 0.
    pub depth: usize,
}

/// Outcome of `remove_node`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeRemoval {
    pub removed: bool,
    /// Descendant codes dropped together with the node (`Prune` only).
    pub pruned: Vec<CodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeTreeError {
    NodeNotFound(CodeId),
    ParentNotFound(CodeId),
    /// The code already has a node in this tree.
    DuplicateCode(CodeId),
    CycleDetected { code: CodeId, parent: CodeId },
}

impl Display for CodeTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(code) => write!(f, "code node not found: {code}"),
            Self::ParentNotFound(code) => write!(f, "code parent not found: {code}"),
            Self::DuplicateCode(code) => write!(f, "code already in code system: {code}"),
            Self::CycleDetected { code, parent } => write!(
                f,
                "move would create cycle: code {code} under parent {parent}"
            ),
        }
    }
}

impl Error for CodeTreeError {}

/// Finds the node carrying `code`.
pub fn locate(tree: &CodeSystem, code: CodeId) -> Option<CodeLocation> {
    locate_in(&tree.roots, code, None, 0)
}

fn locate_in(
    nodes: &[CodeNode],
    code: CodeId,
    parent: Option<CodeId>,
    depth: usize,
) -> Option<CodeLocation> {
    for (index, node) in nodes.iter().enumerate() {
        if node.code == code {
            return Some(CodeLocation {
                parent,
                index,
                depth,
            });
        }
        if let Some(found) = locate_in(&node.children, code, Some(node.code), depth + 1) {
            return Some(found);
        }
    }
    None
}

/// Detaches every node carrying `code` from its parent.
///
/// With `Promote` the node's children take its place, in order. With `Prune`
/// the whole subtree goes and the dropped descendants are reported in
/// `CodeRemoval::pruned`. A missing code leaves the tree unchanged.
pub fn remove_node(
    mut tree: CodeSystem,
    code: CodeId,
    mode: CodeRemovalMode,
) -> (CodeSystem, CodeRemoval) {
    let mut removal = CodeRemoval::default();
    remove_from(&mut tree.roots, code, mode, &mut removal);
    (tree, removal)
}

fn remove_from(
    nodes: &mut Vec<CodeNode>,
    code: CodeId,
    mode: CodeRemovalMode,
    removal: &mut CodeRemoval,
) {
    let mut index = 0;
    while index < nodes.len() {
        if nodes[index].code != code {
            remove_from(&mut nodes[index].children, code, mode, removal);
            index += 1;
            continue;
        }

        let node = nodes.remove(index);
        removal.removed = true;
        match mode {
            // Promoted children are scanned again from `index`.
            CodeRemovalMode::Promote => {
                for (offset, child) in node.children.into_iter().enumerate() {
                    nodes.insert(index + offset, child);
                }
            }
            CodeRemovalMode::Prune => {
                let mut dropped = Vec::new();
                collect_codes(&node.children, &mut dropped);
                for dropped_code in dropped {
                    if dropped_code != code && !removal.pruned.contains(&dropped_code) {
                        removal.pruned.push(dropped_code);
                    }
                }
            }
        }
    }
}

/// Adds a leaf for `code` under `parent` (root level when `None`).
///
/// `index` past the end, or `None`, appends.
pub fn insert_node(
    mut tree: CodeSystem,
    parent: Option<CodeId>,
    code: CodeId,
    index: Option<usize>,
) -> Result<CodeSystem, CodeTreeError> {
    if tree.contains(code) {
        return Err(CodeTreeError::DuplicateCode(code));
    }
    attach(&mut tree, parent, CodeNode::leaf(code), index)?;
    Ok(tree)
}

/// Moves the subtree rooted at `code` under `new_parent`.
pub fn reparent(
    mut tree: CodeSystem,
    code: CodeId,
    new_parent: Option<CodeId>,
    index: Option<usize>,
) -> Result<CodeSystem, CodeTreeError> {
    if locate(&tree, code).is_none() {
        return Err(CodeTreeError::NodeNotFound(code));
    }
    if let Some(parent) = new_parent {
        if parent == code || subtree_contains(&tree, code, parent) {
            return Err(CodeTreeError::CycleDetected { code, parent });
        }
        if locate(&tree, parent).is_none() {
            return Err(CodeTreeError::ParentNotFound(parent));
        }
    }

    let node = detach(&mut tree.roots, code).ok_or(CodeTreeError::NodeNotFound(code))?;
    attach(&mut tree, new_parent, node, index)?;
    Ok(tree)
}

fn subtree_contains(tree: &CodeSystem, root: CodeId, candidate: CodeId) -> bool {
    find_node(&tree.roots, root).is_some_and(|node| {
        let mut descendants = Vec::new();
        collect_codes(&node.children, &mut descendants);
        descendants.contains(&candidate)
    })
}

fn find_node(nodes: &[CodeNode], code: CodeId) -> Option<&CodeNode> {
    nodes.iter().find_map(|node| {
        if node.code == code {
            Some(node)
        } else {
            find_node(&node.children, code)
        }
    })
}

fn find_node_mut(nodes: &mut [CodeNode], code: CodeId) -> Option<&mut CodeNode> {
    for node in nodes.iter_mut() {
        if node.code == code {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, code) {
            return Some(found);
        }
    }
    None
}

fn detach(nodes: &mut Vec<CodeNode>, code: CodeId) -> Option<CodeNode> {
    if let Some(index) = nodes.iter().position(|node| node.code == code) {
        return Some(nodes.remove(index));
    }
    nodes
        .iter_mut()
        .find_map(|node| detach(&mut node.children, code))
}

fn attach(
    tree: &mut CodeSystem,
    parent: Option<CodeId>,
    node: CodeNode,
    index: Option<usize>,
) -> Result<(), CodeTreeError> {
    let siblings = match parent {
        None => &mut tree.roots,
        Some(parent) => {
            &mut find_node_mut(&mut tree.roots, parent)
                .ok_or(CodeTreeError::ParentNotFound(parent))?
                .children
        }
    };
    let position = index.map_or(siblings.len(), |value| value.min(siblings.len()));
    siblings.insert(position, node);
    Ok(())
}
