//! Invalidation actions emitted by the policy

use std::fmt;

use serde::{Deserialize, Serialize};
use sheetwise_core::{Timestamp, UnitId};

/// One thing the caller must do after an edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MarkRefreshNeeded(UnitId),
    MarkCompilationNeeded(UnitId),
    ScheduleRecompile(UnitId),
    BumpTimestamp { sheet: String, at: Timestamp },
    /// Must run before the scene's recompilation reads the tables.
    RefreshSharedBehaviorData(String),
    /// Refresh, mark and schedule the scene.
    FullRecompile(String),
    /// Re-examine every unit whose compiled state may depend on `changed`.
    /// Expanded by [`InvalidationPolicy::resolve`](crate::InvalidationPolicy::resolve).
    RecheckAllSceneEventDependencies { changed: UnitId },
}

impl Action {
    /// The unit this action touches.
    pub fn target(&self) -> UnitId {
        match self {
            Action::MarkRefreshNeeded(unit)
            | Action::MarkCompilationNeeded(unit)
            | Action::ScheduleRecompile(unit)
            | Action::RecheckAllSceneEventDependencies { changed: unit } => unit.clone(),
            Action::BumpTimestamp { sheet, .. } => UnitId::sheet(sheet),
            Action::RefreshSharedBehaviorData(scene) | Action::FullRecompile(scene) => {
                UnitId::scene(scene)
            }
        }
    }

    /// Whether executing this action leaves a compiled artifact stale.
    pub fn invalidates_compilation(&self) -> bool {
        matches!(
            self,
            Action::MarkCompilationNeeded(_)
                | Action::ScheduleRecompile(_)
                | Action::BumpTimestamp { .. }
                | Action::FullRecompile(_)
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MarkRefreshNeeded(unit) => write!(f, "refresh {unit}"),
            Action::MarkCompilationNeeded(unit) => write!(f, "mark-compile {unit}"),
            Action::ScheduleRecompile(unit) => write!(f, "schedule {unit}"),
            Action::BumpTimestamp { sheet, at } => write!(f, "bump sheet:{sheet} @{at}"),
            Action::RefreshSharedBehaviorData(scene) => write!(f, "shared-data scene:{scene}"),
            Action::FullRecompile(scene) => write!(f, "full-recompile scene:{scene}"),
            Action::RecheckAllSceneEventDependencies { changed } => write!(f, "recheck {changed}"),
        }
    }
}

/// Render actions one per line.
pub fn render(actions: &[Action]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
