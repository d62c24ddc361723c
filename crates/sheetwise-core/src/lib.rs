//! Sheetwise Core — unit model, inclusion graph, and dependency analysis

pub mod cache;
pub mod clock;
pub mod error;
pub mod graph;
pub mod model;
pub mod project;

#[cfg(test)]
mod tests;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::GraphCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{GraphError, Result};
pub use graph::{CompiledScope, DependencyGraph, DependencyGraphBuilder, UnresolvedReference};
pub use model::{CompilationUnit, Event, EventTree, Timestamp, UnitId, UnitState};
pub use project::{Project, ProjectModel};
