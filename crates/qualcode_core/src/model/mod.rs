//! Domain model for projects and their owned resources.
//!
//! # Responsibility
//! - Define the records stored per collection (`project`, `document`, `quote`, `code`).
//! - Provide typed drafts and change sets consumed by lifecycle hooks.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Documents, quotes and codes reference exactly one owning project.
//! - The code system is embedded in its project and has no identity of its own.

pub mod audit;
pub mod code;
pub mod code_system;
pub mod document;
pub mod principal;
pub mod project;
pub mod quote;
pub mod resource;
pub mod scope;
pub mod validation;
