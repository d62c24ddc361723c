//! Core data structures for compilation units and their event trees

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Identifies a compilation unit. Names are unique within a kind, so a scene
/// and a sheet may share a name without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitId {
    Scene(String),
    ExternalSheet(String),
}

impl UnitId {
    pub fn scene(name: impl Into<String>) -> Self {
        UnitId::Scene(name.into())
    }

    pub fn sheet(name: impl Into<String>) -> Self {
        UnitId::ExternalSheet(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            UnitId::Scene(name) | UnitId::ExternalSheet(name) => name,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Scene(name) => write!(f, "scene:{name}"),
            UnitId::ExternalSheet(name) => write!(f, "sheet:{name}"),
        }
    }
}

impl FromStr for UnitId {
    type Err = GraphError;

    /// Parses `scene:<name>` or `sheet:<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("scene", name)) if !name.is_empty() => Ok(UnitId::scene(name)),
            Some(("sheet", name)) if !name.is_empty() => Ok(UnitId::sheet(name)),
            _ => Err(GraphError::InvalidUnitId(s.to_string())),
        }
    }
}

/// Last-change stamp of a unit, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of an event tree. Only `Include` matters to dependency analysis;
/// the other variants exist so walkers see realistic nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Conditions/actions with optional sub-events.
    Standard { sub_events: Vec<Event> },
    /// A named folder of events.
    Group { name: String, sub_events: Vec<Event> },
    Comment(String),
    /// "Include external events": pulls the named sheet's events in.
    Include { target: String },
}

impl Event {
    pub fn include(target: impl Into<String>) -> Self {
        Event::Include {
            target: target.into(),
        }
    }
}

/// The root list of events owned by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventTree {
    pub events: Vec<Event>,
}

impl EventTree {
    pub fn new(events: Vec<Event>) -> Self {
        EventTree { events }
    }

    /// Tree whose only content is one include per target, in order.
    pub fn including<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventTree {
            events: targets.into_iter().map(Event::include).collect(),
        }
    }

    /// Direct inclusion references, in document order, duplicates removed.
    /// Nested sub-events are walked; included sheets are not resolved.
    pub fn inclusion_references(&self) -> Vec<String> {
        let mut found = Vec::new();
        let mut stack: Vec<&Event> = self.events.iter().rev().collect();

        while let Some(event) = stack.pop() {
            match event {
                Event::Include { target } => {
                    if !found.contains(target) {
                        found.push(target.clone());
                    }
                }
                Event::Standard { sub_events } | Event::Group { sub_events, .. } => {
                    stack.extend(sub_events.iter().rev());
                }
                Event::Comment(_) => {}
            }
        }

        found
    }
}

/// Derived dirtiness of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitState {
    Clean,
    /// Refresh is always set when dirty; `compile` says whether the compiled
    /// artifact is stale too.
    Dirty { compile: bool },
}

/// An editable scene or external sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub id: UnitId,
    pub events: EventTree,
    pub needs_recompilation: bool,
    /// UI-only, orthogonal to compilation.
    pub needs_refresh: bool,
    pub last_modified: Timestamp,
}

impl CompilationUnit {
    pub fn new(id: UnitId, events: EventTree) -> Self {
        CompilationUnit {
            id,
            events,
            needs_recompilation: false,
            needs_refresh: false,
            last_modified: Timestamp::default(),
        }
    }

    pub fn state(&self) -> UnitState {
        match (self.needs_refresh, self.needs_recompilation) {
            (false, false) => UnitState::Clean,
            (_, compile) => UnitState::Dirty { compile },
        }
    }
}
