//! Inclusion graph over scenes and external sheets, built with petgraph

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::model::UnitId;
use crate::project::ProjectModel;

/// Where a unit's generated code ends up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompiledScope {
    /// Emitted as part of this scene's compiled artifact.
    Scene(String),
    /// The sheet has its own artifact.
    Independent(String),
}

/// An include that names a sheet the project does not have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub from: UnitId,
    pub target: String,
}

/// Derived view of which sheets each scene reaches and who owns each sheet.
///
/// Built project-wide in one pass and never persisted: it is a pure function
/// of the units and their inclusion edges at `generation()`.
pub struct DependencyGraph {
    inner: DiGraph<UnitId, ()>,
    index: HashMap<UnitId, NodeIndex>,
    scene_order: Vec<String>,
    sheet_order: Vec<String>,
    /// scene -> sheets it transitively includes
    dependencies: HashMap<String, BTreeSet<String>>,
    /// sheet -> scenes that transitively include it
    reached_by: HashMap<String, BTreeSet<String>>,
    unresolved: Vec<UnresolvedReference>,
    cycles: Vec<Vec<UnitId>>,
    generation: u64,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("cycles", &self.cycles.len())
            .field("unresolved", &self.unresolved.len())
            .finish()
    }
}

/// Builds [`DependencyGraph`]s from a project.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    /// Analyze the project with `root_scene` as the scene under edit.
    ///
    /// Exclusivity is project-wide, so every scene is walked regardless; the
    /// root is only validated.
    pub fn analyze<P: ProjectModel + ?Sized>(project: &P, root_scene: &str) -> Result<DependencyGraph> {
        project.require(&UnitId::scene(root_scene))?;
        Self::build(project)
    }

    /// Build the graph for every scene and sheet of the project.
    pub fn build<P: ProjectModel + ?Sized>(project: &P) -> Result<DependencyGraph> {
        let scene_order = project.scene_names();
        let sheet_order = project.sheet_names();

        let mut inner = DiGraph::new();
        let mut index = HashMap::new();
        for id in scene_order
            .iter()
            .map(UnitId::scene)
            .chain(sheet_order.iter().map(UnitId::sheet))
        {
            let idx = inner.add_node(id.clone());
            index.insert(id, idx);
        }

        let mut unresolved = Vec::new();
        let units: Vec<(UnitId, NodeIndex)> = index.iter().map(|(id, idx)| (id.clone(), *idx)).collect();
        for (from, from_idx) in units {
            for target in project.direct_inclusions(&from)? {
                match index.get(&UnitId::sheet(&target)) {
                    Some(&to_idx) => {
                        inner.update_edge(from_idx, to_idx, ());
                    }
                    None => {
                        tracing::debug!("{} includes unknown sheet {}", from, target);
                        unresolved.push(UnresolvedReference { from: from.clone(), target });
                    }
                }
            }
        }
        unresolved.sort_by(|a, b| (&a.from, &a.target).cmp(&(&b.from, &b.target)));

        let mut graph = DependencyGraph {
            inner,
            index,
            scene_order,
            sheet_order,
            dependencies: HashMap::new(),
            reached_by: HashMap::new(),
            unresolved,
            cycles: Vec::new(),
            generation: project.generation(),
        };
        graph.compute_reachability();
        graph.compute_cycles();

        tracing::debug!(
            "Built dependency graph: {} scenes, {} sheets, {} inclusions, {} cycles",
            graph.scene_order.len(),
            graph.sheet_order.len(),
            graph.inner.edge_count(),
            graph.cycles.len()
        );
        Ok(graph)
    }
}

impl DependencyGraph {
    fn compute_reachability(&mut self) {
        for scene in &self.scene_order {
            let start = self.index[&UnitId::scene(scene)];
            let sheets = self.walk(start, Direction::Outgoing);
            for sheet in &sheets {
                self.reached_by
                    .entry(sheet.clone())
                    .or_default()
                    .insert(scene.clone());
            }
            self.dependencies.insert(scene.clone(), sheets);
        }
    }

    /// Sheets reachable from `start` (excluding `start` itself). The DFS
    /// keeps a discovered set, so a sheet already visited is never
    /// descended into again and cycles terminate.
    fn walk(&self, start: NodeIndex, direction: Direction) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut visit = |idx: NodeIndex| {
            if idx == start {
                return;
            }
            if let UnitId::ExternalSheet(name) = &self.inner[idx] {
                found.insert(name.clone());
            }
        };

        match direction {
            Direction::Outgoing => {
                let mut dfs = Dfs::new(&self.inner, start);
                while let Some(idx) = dfs.next(&self.inner) {
                    visit(idx);
                }
            }
            Direction::Incoming => {
                let reversed = Reversed(&self.inner);
                let mut dfs = Dfs::new(reversed, start);
                while let Some(idx) = dfs.next(reversed) {
                    visit(idx);
                }
            }
        }
        found
    }

    fn compute_cycles(&mut self) {
        let mut cycles: Vec<Vec<UnitId>> = tarjan_scc(&self.inner)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.inner.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut members: Vec<UnitId> =
                    component.into_iter().map(|idx| self.inner[idx].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        for cycle in &cycles {
            let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            tracing::debug!("Inclusion cycle: {}", names.join(" -> "));
        }
        self.cycles = cycles;
    }

    fn sheet_index(&self, sheet: &str) -> Result<NodeIndex> {
        let id = UnitId::sheet(sheet);
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::NotFound(id))
    }

    /// Sheets transitively included by `scene`.
    pub fn external_dependencies_of(&self, scene: &str) -> Result<&BTreeSet<String>> {
        self.dependencies
            .get(scene)
            .ok_or_else(|| GraphError::NotFound(UnitId::scene(scene)))
    }

    /// The only scene that reaches `sheet`, or `None` when zero or several
    /// scenes reach it.
    pub fn exclusive_owner_of(&self, sheet: &str) -> Result<Option<&str>> {
        self.sheet_index(sheet)?;
        Ok(match self.reached_by.get(sheet) {
            Some(scenes) if scenes.len() == 1 => scenes.iter().next().map(String::as_str),
            _ => None,
        })
    }

    /// Scenes transitively including `sheet`, in project order.
    pub fn scenes_reaching(&self, sheet: &str) -> Result<Vec<&str>> {
        self.sheet_index(sheet)?;
        let Some(scenes) = self.reached_by.get(sheet) else {
            return Ok(Vec::new());
        };
        Ok(self
            .scene_order
            .iter()
            .filter(|name| scenes.contains(*name))
            .map(String::as_str)
            .collect())
    }

    /// Other sheets transitively included by `sheet`, in project order.
    pub fn sheet_dependencies_of(&self, sheet: &str) -> Result<Vec<&str>> {
        let start = self.sheet_index(sheet)?;
        let sheets = self.walk(start, Direction::Outgoing);
        Ok(self.in_sheet_order(&sheets))
    }

    /// Other sheets transitively including `sheet`, in project order.
    pub fn sheets_reaching(&self, sheet: &str) -> Result<Vec<&str>> {
        let start = self.sheet_index(sheet)?;
        let sheets = self.walk(start, Direction::Incoming);
        Ok(self.in_sheet_order(&sheets))
    }

    /// Members of `sheets` in project order.
    pub fn in_sheet_order(&self, sheets: &BTreeSet<String>) -> Vec<&str> {
        self.sheets().filter(|name| sheets.contains(*name)).collect()
    }

    /// Where `unit`'s code is compiled: scenes compile into themselves, an
    /// exclusively-owned sheet inline into its owner, any other sheet on
    /// its own.
    pub fn compiled_scope(&self, unit: &UnitId) -> Result<CompiledScope> {
        match unit {
            UnitId::Scene(name) => {
                self.external_dependencies_of(name)?;
                Ok(CompiledScope::Scene(name.clone()))
            }
            UnitId::ExternalSheet(name) => Ok(match self.exclusive_owner_of(name)? {
                Some(owner) => CompiledScope::Scene(owner.to_string()),
                None => CompiledScope::Independent(name.clone()),
            }),
        }
    }

    pub fn is_compiled_independently(&self, sheet: &str) -> Result<bool> {
        Ok(self.exclusive_owner_of(sheet)?.is_none())
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.index.contains_key(unit)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &str> {
        self.sheet_order.iter().map(String::as_str)
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Groups of units that include each other, each sorted.
    pub fn cycles(&self) -> &[Vec<UnitId>] {
        &self.cycles
    }

    pub fn unresolved_references(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Project generation the graph was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn inclusion_count(&self) -> usize {
        self.inner.edge_count()
    }
}
