//! Shared types, errors, and configuration for the Plandeck workspace.
//!
//! Plandeck is the client-side orchestration layer of a planning-history
//! dashboard: site "bundles" are browsed like repositories, their
//! applications like commits, with a citation-bearing Q&A assistant scoped
//! to the current selection.

pub mod config;
pub mod error;
pub mod types;

pub use config::PlandeckConfig;
pub use error::{ErrorSlot, PlandeckError, Result};
pub use types::*;
