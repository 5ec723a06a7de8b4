//! Authorization and consistency services.
//!
//! # Responsibility
//! - Decide access (`access_guard`) and visibility (`scope_filter`).
//! - Run lifecycle hooks and cascades around every store mutation.
//! - Expose request-level entry points (`resource_service`, `analytics`).

pub mod access_guard;
pub mod analytics;
pub mod cascade;
pub mod code_tree;
pub mod error;
pub mod hooks;
pub mod resource_service;
pub mod scope_filter;
