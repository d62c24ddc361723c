//! Decides which units an edit invalidates

use std::collections::HashSet;
use std::rc::Rc;

use sheetwise_core::{
    Clock, CompiledScope, DependencyGraph, DependencyGraphBuilder, GraphCache, ProjectModel,
    SystemClock, Timestamp, UnitId,
};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::config::PolicyConfig;
use crate::edit::{Edit, EditDescriptor, Scope, StructuralChange};
use crate::error::Result;

/// Translates edits into invalidation actions.
///
/// The policy never mutates the project; it reads the inclusion graph and
/// returns actions for the caller to apply (see
/// [`apply_actions`](crate::apply_actions)). Timestamps come from the
/// injected clock.
#[derive(Debug)]
pub struct InvalidationPolicy<C = SystemClock> {
    config: PolicyConfig,
    clock: C,
    cache: GraphCache,
}

impl InvalidationPolicy<SystemClock> {
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for InvalidationPolicy<SystemClock> {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl<C: Clock> InvalidationPolicy<C> {
    pub fn with_clock(config: PolicyConfig, clock: C) -> Self {
        InvalidationPolicy {
            config,
            clock,
            cache: GraphCache::new(),
        }
    }

    /// Current dependency graph of `project`, from cache when the
    /// inclusion generation has not moved.
    pub fn graph<P: ProjectModel + ?Sized>(&self, project: &P) -> Result<Rc<DependencyGraph>> {
        if self.config.cache_graph {
            Ok(self.cache.get_or_build(project)?)
        } else {
            Ok(Rc::new(DependencyGraphBuilder::build(project)?))
        }
    }

    /// Decide the actions for any reported edit.
    pub fn decide<P: ProjectModel + ?Sized>(&self, project: &P, edit: &Edit) -> Result<Vec<Action>> {
        let actions = match edit {
            Edit::Structural { scope, change } => self.on_structural_edit(project, scope, change)?,
            Edit::ObjectEdited { scope, .. } | Edit::BehaviorEdited { scope, .. } => {
                self.on_runtime_state_edit(project, scope)?
            }
            Edit::ObjectVariablesChanged { scope, .. } => match scope {
                Scope::Specific(_) => self.on_runtime_state_edit(project, scope)?,
                Scope::AllScenes => self.on_global_edit(project),
            },
            Edit::ResourceModified { .. } => self.on_global_edit(project),
            Edit::EventsModified(descriptor) => self.on_events_modified(project, descriptor)?,
            Edit::SceneAdded { name } | Edit::SceneRenamed { name, .. } => {
                self.on_unit_identity_changed(project, &UnitId::scene(name), None)?
            }
            Edit::SheetAdded { name } => {
                self.on_unit_identity_changed(project, &UnitId::sheet(name), None)?
            }
            Edit::SheetRenamed { name, old_name } => {
                self.on_unit_identity_changed(project, &UnitId::sheet(name), Some(old_name.as_str()))?
            }
            Edit::SceneDeleted { name } => self.on_unit_deleted(project, &UnitId::scene(name)),
            Edit::SheetDeleted { name } => self.on_unit_deleted(project, &UnitId::sheet(name)),
        };
        debug!("{:?} -> {} actions", edit, actions.len());
        Ok(actions)
    }

    /// Objects, groups, shared variables or behaviors changed: the scene's
    /// generated code embeds these, so it is fully recompiled.
    pub fn on_structural_edit<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        scope: &Scope,
        change: &StructuralChange,
    ) -> Result<Vec<Action>> {
        let rebuild = change.rebuilds_shared_behavior_data();
        let mut actions = Vec::new();

        match scope {
            Scope::Specific(scene) => {
                project.require(&UnitId::scene(scene))?;
                if rebuild {
                    actions.push(Action::RefreshSharedBehaviorData(scene.clone()));
                }
                actions.push(Action::FullRecompile(scene.clone()));

                if self.config.bump_included_sheets_on_full_recompile {
                    let graph = self.graph(project)?;
                    let mut independent = Vec::new();
                    for sheet in graph.external_dependencies_of(scene)? {
                        if graph.is_compiled_independently(sheet)? {
                            independent.push(sheet.as_str());
                        }
                    }
                    actions.extend(self.bumps(independent));
                }
            }
            Scope::AllScenes => {
                if rebuild {
                    actions.extend(
                        project
                            .scene_names()
                            .into_iter()
                            .map(Action::RefreshSharedBehaviorData),
                    );
                }
                actions.extend(self.on_global_edit(project));
            }
        }

        Ok(self.finish(actions))
    }

    /// Appearance or runtime state changed; generated code did not.
    pub fn on_runtime_state_edit<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        scope: &Scope,
    ) -> Result<Vec<Action>> {
        match scope {
            Scope::Specific(scene) => {
                let unit = UnitId::scene(scene);
                project.require(&unit)?;
                Ok(vec![Action::MarkRefreshNeeded(unit)])
            }
            Scope::AllScenes => Ok(project
                .scene_names()
                .into_iter()
                .map(|scene| Action::MarkRefreshNeeded(UnitId::scene(scene)))
                .collect()),
        }
    }

    /// A project-wide variable or resource changed: every scene is stale and
    /// so is every sheet, since a sheet may be compiled on its own.
    pub fn on_global_edit<P: ProjectModel + ?Sized>(&self, project: &P) -> Vec<Action> {
        let scenes = project.scene_names();
        let sheets = project.sheet_names();
        info!(
            "Global change: invalidating {} scenes and {} sheets",
            scenes.len(),
            sheets.len()
        );

        let mut actions = Vec::with_capacity(scenes.len() * 2 + sheets.len());
        for scene in scenes {
            let unit = UnitId::scene(scene);
            actions.push(Action::MarkRefreshNeeded(unit.clone()));
            actions.push(Action::MarkCompilationNeeded(unit));
        }
        actions.extend(self.bumps(sheets.iter().map(String::as_str)));
        self.finish(actions)
    }

    pub fn on_events_modified<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        descriptor: &EditDescriptor,
    ) -> Result<Vec<Action>> {
        let origin = descriptor.indirect_origin.as_ref();
        match &descriptor.unit {
            UnitId::Scene(scene) => self.on_scene_events_modified(project, scene, descriptor.direct, origin),
            UnitId::ExternalSheet(sheet) => {
                self.on_sheet_events_modified(project, sheet, descriptor.direct, origin)
            }
        }
    }

    /// Events of `scene` changed, directly or because of `origin`.
    ///
    /// An indirect change only recompiles the scene when the origin's body
    /// is part of the scene's artifact. When the origin is a sheet with its
    /// own artifact, that sheet is recompiled instead and the scene is left
    /// alone.
    pub fn on_scene_events_modified<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        scene: &str,
        direct: bool,
        origin: Option<&UnitId>,
    ) -> Result<Vec<Action>> {
        let unit = UnitId::scene(scene);
        project.require(&unit)?;

        if !direct {
            match origin {
                None => warn!("Indirect change in {} without origin, treating as direct", unit),
                Some(origin) => {
                    project.require(origin)?;
                    let graph = self.graph(project)?;
                    match graph.compiled_scope(origin)? {
                        CompiledScope::Independent(sheet) => {
                            debug!("{} untouched: {} is compiled on its own", unit, origin);
                            return Ok(self.independent_recompile(&sheet));
                        }
                        CompiledScope::Scene(owner) if owner == scene => {
                            debug!("{} is compiled into {}", origin, unit);
                        }
                        CompiledScope::Scene(owner) => {
                            debug!(
                                "{} is compiled into scene {}, recompiling {} anyway",
                                origin, owner, unit
                            );
                        }
                    }
                }
            }
        }

        Ok(vec![
            Action::MarkRefreshNeeded(unit.clone()),
            Action::MarkCompilationNeeded(unit.clone()),
            Action::ScheduleRecompile(unit),
        ])
    }

    /// Events of `sheet` changed, directly or because of `origin`.
    ///
    /// A sheet owned by exactly one scene has no artifact of its own, so
    /// nothing is emitted here; the owning scene must be notified instead
    /// (see [`events_changed_with_dependents`](Self::events_changed_with_dependents)).
    /// A sheet with its own artifact is rebuilt for any change it includes,
    /// unless the change originated in that same artifact.
    pub fn on_sheet_events_modified<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        sheet: &str,
        direct: bool,
        origin: Option<&UnitId>,
    ) -> Result<Vec<Action>> {
        let unit = UnitId::sheet(sheet);
        project.require(&unit)?;
        if let Some(origin) = origin {
            project.require(origin)?;
        }

        let graph = self.graph(project)?;
        if let Some(owner) = graph.exclusive_owner_of(sheet)? {
            debug!("{} is compiled inline with scene {}, no standalone recompile", unit, owner);
            return Ok(Vec::new());
        }

        if !direct {
            match origin {
                None => warn!("Indirect change in {} without origin, treating as direct", unit),
                Some(origin) => match graph.compiled_scope(origin)? {
                    CompiledScope::Independent(covering) if covering == sheet => {
                        debug!("{} already covered by its own compilation", unit);
                        return Ok(Vec::new());
                    }
                    _ => debug!("{} includes {}, recompiling", unit, origin),
                },
            }
        }

        Ok(self.independent_recompile(sheet))
    }

    /// A unit was added or renamed: inclusions may now resolve differently.
    ///
    /// For a renamed sheet, units still including `previous_sheet_name`
    /// hold the old body in their artifacts and are recompiled along with
    /// their dependents.
    pub fn on_unit_identity_changed<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        unit: &UnitId,
        previous_sheet_name: Option<&str>,
    ) -> Result<Vec<Action>> {
        project.require(unit)?;
        let mut actions = vec![Action::RecheckAllSceneEventDependencies {
            changed: unit.clone(),
        }];

        if let Some(old_name) = previous_sheet_name {
            let graph = self.graph(project)?;
            for reference in graph.unresolved_references() {
                if reference.target == old_name {
                    debug!("{} still includes {} by its old name", reference.from, old_name);
                    actions.extend(self.events_changed_with_dependents(project, &reference.from)?);
                }
            }
        }
        Ok(self.finish(actions))
    }

    /// A unit was deleted. Exclusivity of any sheet may have flipped, so
    /// every remaining scene is recompiled and every remaining sheet stamped.
    pub fn on_unit_deleted<P: ProjectModel + ?Sized>(&self, project: &P, unit: &UnitId) -> Vec<Action> {
        if project.contains(unit) {
            debug!("{} reported deleted but still present", unit);
        }
        let scenes = project.scene_names();
        let sheets = project.sheet_names();
        info!(
            "{} deleted: full recompilation of {} scenes, {} sheets stamped",
            unit,
            scenes.len(),
            sheets.len()
        );

        let mut actions: Vec<Action> = scenes.into_iter().map(Action::FullRecompile).collect();
        actions.extend(self.bumps(sheets.iter().map(String::as_str)));
        self.finish(actions)
    }

    /// Treat `unit` as directly edited and notify every unit that reaches
    /// it as indirectly edited.
    pub fn events_changed_with_dependents<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        unit: &UnitId,
    ) -> Result<Vec<Action>> {
        project.require(unit)?;
        let sheet = match unit {
            UnitId::Scene(scene) => return self.on_scene_events_modified(project, scene, true, None),
            UnitId::ExternalSheet(sheet) => sheet,
        };

        let graph = self.graph(project)?;
        let mut actions = self.on_sheet_events_modified(project, sheet, true, None)?;
        for scene in graph.scenes_reaching(sheet)? {
            actions.extend(self.on_scene_events_modified(project, scene, false, Some(unit))?);
        }
        for other in graph.sheets_reaching(sheet)? {
            actions.extend(self.on_sheet_events_modified(project, other, false, Some(unit))?);
        }
        Ok(self.finish(actions))
    }

    /// Re-examine everything whose compiled shape may depend on `changed`,
    /// which was just added or renamed.
    ///
    /// The sheets `changed` reaches (and a changed sheet itself) may have
    /// gained or lost reaching scenes, flipping them between inline and
    /// standalone compilation. Every scene reaching one of them is
    /// recompiled and each of them with its own artifact is rebuilt.
    pub fn recheck_dependencies<P: ProjectModel + ?Sized>(
        &self,
        project: &P,
        changed: &UnitId,
    ) -> Result<Vec<Action>> {
        let mut actions = self.events_changed_with_dependents(project, changed)?;

        let graph = self.graph(project)?;
        let touched: Vec<&str> = match changed {
            UnitId::Scene(scene) => graph.in_sheet_order(graph.external_dependencies_of(scene)?),
            UnitId::ExternalSheet(sheet) => {
                let mut touched = vec![sheet.as_str()];
                touched.extend(graph.sheet_dependencies_of(sheet)?);
                touched
            }
        };
        info!("Rechecking {}: {} sheet(s) may have changed owner", changed, touched.len());

        for sheet in &touched {
            for scene in graph.scenes_reaching(sheet)? {
                actions.extend(self.on_scene_events_modified(project, scene, true, None)?);
            }
        }
        for sheet in touched {
            if graph.is_compiled_independently(sheet)? {
                actions.extend(self.independent_recompile(sheet));
            }
        }
        Ok(self.finish(actions))
    }

    /// Expand recheck actions against the current project so the result can
    /// be applied to a sink.
    pub fn resolve<P: ProjectModel + ?Sized>(&self, project: &P, actions: Vec<Action>) -> Result<Vec<Action>> {
        let mut resolved = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::RecheckAllSceneEventDependencies { changed } => {
                    resolved.extend(self.recheck_dependencies(project, &changed)?);
                }
                other => resolved.push(other),
            }
        }
        Ok(self.finish(resolved))
    }

    fn independent_recompile(&self, sheet: &str) -> Vec<Action> {
        vec![
            Action::BumpTimestamp {
                sheet: sheet.to_string(),
                at: self.clock.now(),
            },
            Action::ScheduleRecompile(UnitId::sheet(sheet)),
        ]
    }

    /// One stamp shared by every sheet of a single decision.
    fn bumps<'a>(&self, sheets: impl IntoIterator<Item = &'a str>) -> Vec<Action> {
        let mut sheets = sheets.into_iter().peekable();
        if sheets.peek().is_none() {
            return Vec::new();
        }
        let at: Timestamp = self.clock.now();
        sheets
            .map(|sheet| Action::BumpTimestamp {
                sheet: sheet.to_string(),
                at,
            })
            .collect()
    }

    /// Drop repeats, keeping first occurrences. Two stamps of the same sheet
    /// count as repeats whatever their time.
    fn finish(&self, actions: Vec<Action>) -> Vec<Action> {
        if !self.config.dedup_actions {
            return actions;
        }
        let mut seen = HashSet::new();
        actions
            .into_iter()
            .filter(|action| {
                let key = match action {
                    Action::BumpTimestamp { sheet, .. } => Action::BumpTimestamp {
                        sheet: sheet.clone(),
                        at: Timestamp::default(),
                    },
                    other => other.clone(),
                };
                seen.insert(key)
            })
            .collect()
    }
}
