//! Generation-keyed cache for the dependency graph

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::project::ProjectModel;

/// Holds the most recently built graph and hands it out again while the
/// project's generation is unchanged. Any inclusion change moves the
/// generation, so a stale graph is never returned.
///
/// Single-threaded: the policy runs on the thread that observed the edit.
#[derive(Debug, Default)]
pub struct GraphCache {
    cached: RefCell<Option<Rc<DependencyGraph>>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build<P: ProjectModel + ?Sized>(&self, project: &P) -> Result<Rc<DependencyGraph>> {
        let generation = project.generation();
        if let Some(graph) = self.cached.borrow().as_ref() {
            if graph.generation() == generation {
                return Ok(Rc::clone(graph));
            }
            tracing::debug!(
                "Graph cache stale (generation {} -> {})",
                graph.generation(),
                generation
            );
        }

        let graph = Rc::new(DependencyGraphBuilder::build(project)?);
        *self.cached.borrow_mut() = Some(Rc::clone(&graph));
        Ok(graph)
    }

    /// Drop the cached graph.
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }

    /// Generation of the cached graph, if any.
    pub fn cached_generation(&self) -> Option<u64> {
        self.cached.borrow().as_ref().map(|graph| graph.generation())
    }
}
