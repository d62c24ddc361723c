//! Invalidation policy for scenes and external event sheets
//!
//! Given an edit and the project's inclusion graph, this crate decides which
//! units must be refreshed, marked for compilation, rescheduled, or stamped,
//! and which edits are already covered by another unit's own compilation.

pub mod action;
pub mod config;
pub mod edit;
pub mod error;
pub mod policy;
pub mod sink;


pub use action::{Action, render};
pub use config::PolicyConfig;
pub use edit::{Edit, EditDescriptor, Scope, StructuralChange};
pub use error::{ConfigError, PolicyError, Result};
pub use policy::InvalidationPolicy;
pub use sink::{ActionSink, RecordingSink, apply_actions};
