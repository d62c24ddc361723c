//! Project model: the set of units the analysis reads from

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{GraphError, Result};
use crate::model::{CompilationUnit, EventTree, Timestamp, UnitId};

/// Read access to a project's units, as needed by dependency analysis.
pub trait ProjectModel {
    /// Scene names in project order.
    fn scene_names(&self) -> Vec<String>;

    /// External sheet names in project order.
    fn sheet_names(&self) -> Vec<String>;

    fn contains(&self, unit: &UnitId) -> bool;

    /// Sheet names directly included by `unit`'s event tree. No transitive
    /// resolution happens here.
    fn direct_inclusions(&self, unit: &UnitId) -> Result<Vec<String>>;

    /// Stamp that changes whenever any inclusion edge may have changed.
    ///
    /// Two models reporting the same generation must have the same units
    /// and inclusions, so a graph built from one is valid for the other.
    fn generation(&self) -> u64;

    fn require(&self, unit: &UnitId) -> Result<()> {
        if self.contains(unit) {
            Ok(())
        } else {
            Err(GraphError::NotFound(unit.clone()))
        }
    }
}

/// Source of generations for every [`Project`] in the process. Drawing
/// from one counter keeps generations of diverging clones distinct.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// In-memory project holding scenes and external sheets in insertion order.
///
/// A clone keeps its generation until either copy changes its inclusions.
///
/// Besides the units themselves it keeps the compilation queue that
/// scheduled recompilations land in, and a log of shared behavior data
/// rebuilds, both drained by the caller.
#[derive(Debug, Clone, Default)]
pub struct Project {
    scenes: Vec<CompilationUnit>,
    sheets: Vec<CompilationUnit>,
    generation: u64,
    compilation_queue: Vec<UnitId>,
    shared_data_rebuilds: Vec<String>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scene(&mut self, name: impl Into<String>, events: EventTree) -> Result<()> {
        self.add(CompilationUnit::new(UnitId::scene(name), events))
    }

    pub fn add_sheet(&mut self, name: impl Into<String>, events: EventTree) -> Result<()> {
        self.add(CompilationUnit::new(UnitId::sheet(name), events))
    }

    fn add(&mut self, unit: CompilationUnit) -> Result<()> {
        if self.contains(&unit.id) {
            return Err(GraphError::Duplicate(unit.id));
        }
        tracing::debug!("Adding {} to project", unit.id);
        match unit.id {
            UnitId::Scene(_) => self.scenes.push(unit),
            UnitId::ExternalSheet(_) => self.sheets.push(unit),
        }
        self.generation = next_generation();
        Ok(())
    }

    /// Remove a unit, returning it.
    pub fn remove(&mut self, id: &UnitId) -> Result<CompilationUnit> {
        let list = self.list_mut(id);
        let pos = list
            .iter()
            .position(|u| &u.id == id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        let unit = list.remove(pos);
        self.compilation_queue.retain(|queued| queued != id);
        self.generation = next_generation();
        tracing::debug!("Removed {} from project", id);
        Ok(unit)
    }

    /// Rename a unit in place. Inclusion references elsewhere are not
    /// rewritten; they may now dangle or resolve to a different sheet.
    pub fn rename(&mut self, id: &UnitId, new_name: impl Into<String>) -> Result<UnitId> {
        let new_id = match id {
            UnitId::Scene(_) => UnitId::scene(new_name),
            UnitId::ExternalSheet(_) => UnitId::sheet(new_name),
        };
        if self.contains(&new_id) {
            return Err(GraphError::Duplicate(new_id));
        }
        let unit = self.unit_mut(id)?;
        unit.id = new_id.clone();
        for queued in &mut self.compilation_queue {
            if queued == id {
                *queued = new_id.clone();
            }
        }
        self.generation = next_generation();
        Ok(new_id)
    }

    /// Replace a unit's event tree. The generation only moves when the set
    /// of inclusion references actually changed.
    pub fn set_events(&mut self, id: &UnitId, events: EventTree) -> Result<()> {
        let unit = self.unit_mut(id)?;
        let mut before = unit.events.inclusion_references();
        let mut after = events.inclusion_references();
        unit.events = events;
        before.sort();
        after.sort();
        if before != after {
            self.generation = next_generation();
            tracing::debug!("Inclusions of {} changed, generation {}", id, self.generation);
        }
        Ok(())
    }

    pub fn unit(&self, id: &UnitId) -> Result<&CompilationUnit> {
        self.list(id)
            .iter()
            .find(|u| &u.id == id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    fn unit_mut(&mut self, id: &UnitId) -> Result<&mut CompilationUnit> {
        self.list_mut(id)
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    fn list(&self, id: &UnitId) -> &Vec<CompilationUnit> {
        match id {
            UnitId::Scene(_) => &self.scenes,
            UnitId::ExternalSheet(_) => &self.sheets,
        }
    }

    fn list_mut(&mut self, id: &UnitId) -> &mut Vec<CompilationUnit> {
        match id {
            UnitId::Scene(_) => &mut self.scenes,
            UnitId::ExternalSheet(_) => &mut self.sheets,
        }
    }

    pub fn scenes(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.scenes.iter()
    }

    pub fn sheets(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.sheets.iter()
    }

    // ── Mutation sinks ──────────────────────────────────────
    // These only ever set flags; clearing belongs to the compiler.

    pub fn set_refresh_needed(&mut self, id: &UnitId) -> Result<()> {
        self.unit_mut(id)?.needs_refresh = true;
        Ok(())
    }

    pub fn set_compilation_needed(&mut self, id: &UnitId) -> Result<()> {
        self.unit_mut(id)?.needs_recompilation = true;
        Ok(())
    }

    /// Queue a compilation task. Already-queued units are not queued twice.
    pub fn enqueue_compilation(&mut self, id: &UnitId) -> Result<()> {
        self.require(id)?;
        if !self.compilation_queue.contains(id) {
            self.compilation_queue.push(id.clone());
        }
        Ok(())
    }

    /// Stamp a sheet. The stamp never moves backwards.
    pub fn bump_timestamp(&mut self, sheet: &str, at: Timestamp) -> Result<()> {
        let unit = self.unit_mut(&UnitId::sheet(sheet))?;
        unit.last_modified = unit.last_modified.max(at);
        Ok(())
    }

    pub fn record_shared_data_rebuild(&mut self, scene: &str) -> Result<()> {
        self.require(&UnitId::scene(scene))?;
        self.shared_data_rebuilds.push(scene.to_string());
        Ok(())
    }

    // ── Compiler side ───────────────────────────────────────

    /// Clears both dirty flags after a successful compile.
    pub fn mark_compiled(&mut self, id: &UnitId) -> Result<()> {
        let unit = self.unit_mut(id)?;
        unit.needs_recompilation = false;
        unit.needs_refresh = false;
        Ok(())
    }

    pub fn compilation_queue(&self) -> &[UnitId] {
        &self.compilation_queue
    }

    pub fn drain_compilation_queue(&mut self) -> Vec<UnitId> {
        std::mem::take(&mut self.compilation_queue)
    }

    pub fn shared_data_rebuilds(&self) -> &[String] {
        &self.shared_data_rebuilds
    }
}

impl ProjectModel for Project {
    fn scene_names(&self) -> Vec<String> {
        self.scenes.iter().map(|u| u.id.name().to_string()).collect()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|u| u.id.name().to_string()).collect()
    }

    fn contains(&self, unit: &UnitId) -> bool {
        self.list(unit).iter().any(|u| &u.id == unit)
    }

    fn direct_inclusions(&self, unit: &UnitId) -> Result<Vec<String>> {
        Ok(self.unit(unit)?.events.inclusion_references())
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}
