//! Edit descriptions fed to the policy

use serde::{Deserialize, Serialize};
use sheetwise_core::UnitId;

/// Which scenes an object-level edit applies to.
///
/// `AllScenes` is an explicit broadcast (project-wide objects, global
/// variables), never "scene unknown".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Specific(String),
    AllScenes,
}

impl Scope {
    pub fn scene(name: impl Into<String>) -> Self {
        Scope::Specific(name.into())
    }
}

/// An events-modified notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDescriptor {
    pub unit: UnitId,
    /// `false` when the modification is a consequence of a change made in
    /// `indirect_origin`.
    pub direct: bool,
    pub indirect_origin: Option<UnitId>,
}

impl EditDescriptor {
    pub fn direct(unit: UnitId) -> Self {
        EditDescriptor {
            unit,
            direct: true,
            indirect_origin: None,
        }
    }

    pub fn indirect(unit: UnitId, origin: UnitId) -> Self {
        EditDescriptor {
            unit,
            direct: false,
            indirect_origin: Some(origin),
        }
    }
}

/// Edits that change identifiers or layout baked into generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuralChange {
    ObjectAdded { object: String },
    ObjectRenamed { object: String, old_name: String },
    ObjectsDeleted { objects: Vec<String> },
    ObjectGroupAdded { group: String },
    ObjectGroupEdited { group: String },
    ObjectGroupRenamed { group: String, old_name: String },
    ObjectGroupDeleted { group: String },
    VariablesModified,
    BehaviorAdded { object: String, behavior: String },
    BehaviorRenamed { object: String, behavior: String, old_name: String },
    BehaviorDeleted { object: String, behavior: String },
}

impl StructuralChange {
    /// Whether per-behavior shared data tables must be rebuilt before the
    /// scene is recompiled.
    pub fn rebuilds_shared_behavior_data(&self) -> bool {
        matches!(
            self,
            StructuralChange::ObjectsDeleted { .. }
                | StructuralChange::BehaviorAdded { .. }
                | StructuralChange::BehaviorRenamed { .. }
                | StructuralChange::BehaviorDeleted { .. }
        )
    }
}

/// Everything the notification layer reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    Structural { scope: Scope, change: StructuralChange },
    /// Object appearance edited.
    ObjectEdited { scope: Scope, object: String },
    BehaviorEdited { scope: Scope, object: String, behavior: String },
    ObjectVariablesChanged { scope: Scope, object: String },
    ResourceModified { resource: String },
    EventsModified(EditDescriptor),
    SceneAdded { name: String },
    SceneRenamed { name: String, old_name: String },
    SheetAdded { name: String },
    SheetRenamed { name: String, old_name: String },
    SceneDeleted { name: String },
    SheetDeleted { name: String },
}
