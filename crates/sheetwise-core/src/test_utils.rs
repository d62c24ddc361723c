//! Test fixtures for sheetwise-core

use crate::model::{Event, EventTree};
use crate::project::Project;

/// Build a project from `(name, includes)` lists. Scenes and sheets are
/// added in the order given.
pub fn project_with(scenes: &[(&str, &[&str])], sheets: &[(&str, &[&str])]) -> Project {
    let mut project = Project::new();
    for (name, includes) in scenes {
        project
            .add_scene(*name, EventTree::including(includes.iter().copied()))
            .unwrap();
    }
    for (name, includes) in sheets {
        project
            .add_sheet(*name, EventTree::including(includes.iter().copied()))
            .unwrap();
    }
    project
}

/// Scenes {A, B}; sheet X included only by A; sheet Y included by both.
pub fn two_scene_project() -> Project {
    project_with(
        &[("A", &["X", "Y"]), ("B", &["Y"])],
        &[("X", &[]), ("Y", &[])],
    )
}

/// A chain of `k` sheets `S0 -> S1 -> ... -> S{k-1} -> S0`, included by
/// scene `Root`.
pub fn cyclic_project(k: usize) -> Project {
    let names: Vec<String> = (0..k).map(|i| format!("S{i}")).collect();
    let mut project = Project::new();
    project
        .add_scene("Root", EventTree::including(["S0"]))
        .unwrap();
    for i in 0..k {
        let next = &names[(i + 1) % k];
        project
            .add_sheet(names[i].as_str(), EventTree::including([next.as_str()]))
            .unwrap();
    }
    project
}

/// An event tree that hides its includes inside nested groups and
/// sub-events.
pub fn nested_tree(targets: &[&str]) -> EventTree {
    let mut events = vec![Event::Comment("header".to_string())];
    for (i, target) in targets.iter().enumerate() {
        let include = Event::include(*target);
        let wrapped = if i % 2 == 0 {
            Event::Group {
                name: format!("group {i}"),
                sub_events: vec![Event::Standard {
                    sub_events: vec![include],
                }],
            }
        } else {
            Event::Standard {
                sub_events: vec![Event::Comment("note".to_string()), include],
            }
        };
        events.push(wrapped);
    }
    EventTree::new(events)
}
