//! Mutation sinks that execute actions

use sheetwise_core::{Project, Timestamp, UnitId};

use crate::action::Action;
use crate::error::{PolicyError, Result};

/// Receives the effects of applied actions. Implementations only ever set
/// state; clearing dirty flags is the compiler's job.
pub trait ActionSink {
    fn mark_refresh_needed(&mut self, unit: &UnitId) -> Result<()>;
    fn mark_compilation_needed(&mut self, unit: &UnitId) -> Result<()>;
    fn schedule_recompile(&mut self, unit: &UnitId) -> Result<()>;
    fn bump_timestamp(&mut self, sheet: &str, at: Timestamp) -> Result<()>;
    fn rebuild_shared_behavior_data(&mut self, scene: &str) -> Result<()>;
}

/// Execute `actions` in order.
///
/// Anything that schedules a compile also sets the refresh and
/// compilation flags first, so no unit goes from clean straight to
/// compile-dirty.
pub fn apply_actions<S: ActionSink + ?Sized>(actions: &[Action], sink: &mut S) -> Result<()> {
    for action in actions {
        match action {
            Action::MarkRefreshNeeded(unit) => sink.mark_refresh_needed(unit)?,
            Action::MarkCompilationNeeded(unit) => {
                sink.mark_refresh_needed(unit)?;
                sink.mark_compilation_needed(unit)?;
            }
            Action::ScheduleRecompile(unit) => {
                sink.mark_refresh_needed(unit)?;
                sink.mark_compilation_needed(unit)?;
                sink.schedule_recompile(unit)?;
            }
            Action::BumpTimestamp { sheet, at } => sink.bump_timestamp(sheet, *at)?,
            Action::RefreshSharedBehaviorData(scene) => sink.rebuild_shared_behavior_data(scene)?,
            Action::FullRecompile(scene) => {
                let unit = UnitId::scene(scene);
                sink.mark_refresh_needed(&unit)?;
                sink.mark_compilation_needed(&unit)?;
                sink.schedule_recompile(&unit)?;
            }
            Action::RecheckAllSceneEventDependencies { changed } => {
                return Err(PolicyError::UnresolvedRecheck(changed.clone()));
            }
        }
    }
    Ok(())
}

impl ActionSink for Project {
    fn mark_refresh_needed(&mut self, unit: &UnitId) -> Result<()> {
        Ok(self.set_refresh_needed(unit)?)
    }

    fn mark_compilation_needed(&mut self, unit: &UnitId) -> Result<()> {
        Ok(self.set_compilation_needed(unit)?)
    }

    fn schedule_recompile(&mut self, unit: &UnitId) -> Result<()> {
        Ok(self.enqueue_compilation(unit)?)
    }

    fn bump_timestamp(&mut self, sheet: &str, at: Timestamp) -> Result<()> {
        Ok(Project::bump_timestamp(self, sheet, at)?)
    }

    fn rebuild_shared_behavior_data(&mut self, scene: &str) -> Result<()> {
        Ok(self.record_shared_data_rebuild(scene)?)
    }
}

/// Sink that records what it was asked to do, for dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    pub calls: Vec<String>,
}

impl ActionSink for RecordingSink {
    fn mark_refresh_needed(&mut self, unit: &UnitId) -> Result<()> {
        self.calls.push(format!("refresh {unit}"));
        Ok(())
    }

    fn mark_compilation_needed(&mut self, unit: &UnitId) -> Result<()> {
        self.calls.push(format!("compile {unit}"));
        Ok(())
    }

    fn schedule_recompile(&mut self, unit: &UnitId) -> Result<()> {
        self.calls.push(format!("schedule {unit}"));
        Ok(())
    }

    fn bump_timestamp(&mut self, sheet: &str, at: Timestamp) -> Result<()> {
        self.calls.push(format!("bump sheet:{sheet} @{at}"));
        Ok(())
    }

    fn rebuild_shared_behavior_data(&mut self, scene: &str) -> Result<()> {
        self.calls.push(format!("shared-data scene:{scene}"));
        Ok(())
    }
}
