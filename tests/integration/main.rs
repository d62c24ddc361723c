//! Integration tests for Sheetwise
//!
//! These tests drive the whole edit -> decide -> resolve -> apply pipeline
//! and the CLI binary.

use std::process::Command;

use sheetwise_core::test_utils::two_scene_project;
use sheetwise_core::{EventTree, ManualClock, Project, ProjectModel, Timestamp, UnitId, UnitState};
use sheetwise_policy::{
    Action, Edit, EditDescriptor, InvalidationPolicy, PolicyConfig, Scope, StructuralChange,
    apply_actions,
};

const MANIFEST: &str = r#"
[[scenes]]
name = "A"
includes = ["X", "Y"]

[[scenes]]
name = "B"
includes = ["Y"]

[[sheets]]
name = "X"

[[sheets]]
name = "Y"
"#;

fn run(project: &mut Project, policy: &InvalidationPolicy<ManualClock>, edit: Edit) -> Vec<Action> {
    let actions = policy.decide(project, &edit).unwrap();
    let actions = policy.resolve(project, actions).unwrap();
    apply_actions(&actions, project).unwrap();
    actions
}

/// Editing an owned sheet reaches its scene only through the dependents
/// expansion; editing a shared sheet never touches the scenes.
#[test]
fn test_edit_session() {
    let mut project = two_scene_project();
    let policy = InvalidationPolicy::with_clock(PolicyConfig::default(), ManualClock::new(10));

    run(
        &mut project,
        &policy,
        Edit::EventsModified(EditDescriptor::direct(UnitId::sheet("Y"))),
    );
    assert_eq!(project.drain_compilation_queue(), vec![UnitId::sheet("Y")]);
    assert_eq!(project.unit(&UnitId::scene("A")).unwrap().state(), UnitState::Clean);
    assert_eq!(
        project.unit(&UnitId::sheet("Y")).unwrap().last_modified,
        Timestamp(10)
    );

    let direct_x = run(
        &mut project,
        &policy,
        Edit::EventsModified(EditDescriptor::direct(UnitId::sheet("X"))),
    );
    assert!(direct_x.is_empty());

    let actions = policy
        .events_changed_with_dependents(&project, &UnitId::sheet("X"))
        .unwrap();
    apply_actions(&actions, &mut project).unwrap();
    assert_eq!(project.drain_compilation_queue(), vec![UnitId::scene("A")]);

    project.mark_compiled(&UnitId::scene("A")).unwrap();
    project.mark_compiled(&UnitId::sheet("Y")).unwrap();

    // Deleting B leaves Y reachable from A alone: it turns inline.
    project.remove(&UnitId::scene("B")).unwrap();
    run(
        &mut project,
        &policy,
        Edit::SceneDeleted {
            name: "B".to_string(),
        },
    );
    assert_eq!(project.drain_compilation_queue(), vec![UnitId::scene("A")]);
    let graph = policy.graph(&project).unwrap();
    assert_eq!(graph.exclusive_owner_of("Y").unwrap(), Some("A"));
}

#[test]
fn test_new_scene_including_owned_sheet_makes_it_shared() {
    let mut project = two_scene_project();
    let policy = InvalidationPolicy::with_clock(PolicyConfig::default(), ManualClock::new(1));

    project.add_scene("C", EventTree::including(["X"])).unwrap();
    run(
        &mut project,
        &policy,
        Edit::SceneAdded {
            name: "C".to_string(),
        },
    );
    // A compiled X inline and must be rebuilt without it.
    assert_eq!(
        project.drain_compilation_queue(),
        vec![UnitId::scene("C"), UnitId::scene("A"), UnitId::sheet("X")]
    );
    assert_eq!(
        project.unit(&UnitId::scene("A")).unwrap().state(),
        UnitState::Dirty { compile: true }
    );
    assert_eq!(project.unit(&UnitId::scene("B")).unwrap().state(), UnitState::Clean);

    // X now has its own artifact.
    let edit = Edit::EventsModified(EditDescriptor::direct(UnitId::sheet("X")));
    let actions = run(&mut project, &policy, edit);
    assert!(actions.contains(&Action::ScheduleRecompile(UnitId::sheet("X"))));
}

#[test]
fn test_renamed_sheet_recompiles_stale_includers() {
    let mut project = two_scene_project();
    let policy = InvalidationPolicy::with_clock(PolicyConfig::default(), ManualClock::new(1));

    project.rename(&UnitId::sheet("X"), "X2").unwrap();
    run(
        &mut project,
        &policy,
        Edit::SheetRenamed {
            name: "X2".to_string(),
            old_name: "X".to_string(),
        },
    );
    assert_eq!(
        project.drain_compilation_queue(),
        vec![UnitId::sheet("X2"), UnitId::scene("A")]
    );
}

#[test]
fn test_structural_edit_is_scene_local() {
    let mut project = two_scene_project();
    let policy = InvalidationPolicy::with_clock(PolicyConfig::default(), ManualClock::new(1));
    run(
        &mut project,
        &policy,
        Edit::Structural {
            scope: Scope::scene("B"),
            change: StructuralChange::ObjectRenamed {
                object: "Hero".to_string(),
                old_name: "Player".to_string(),
            },
        },
    );
    assert_eq!(project.compilation_queue(), &[UnitId::scene("B")]);
    for name in project.scene_names() {
        let expected = if name == "B" {
            UnitState::Dirty { compile: true }
        } else {
            UnitState::Clean
        };
        assert_eq!(project.unit(&UnitId::scene(&name)).unwrap().state(), expected);
    }
}

#[test]
fn test_cli_decide() {
    let dir = tempfile::TempDir::new().unwrap();
    let manifest = dir.path().join("project.toml");
    std::fs::write(&manifest, MANIFEST).unwrap();

    let edit = serde_json::to_string(&Edit::EventsModified(EditDescriptor::direct(
        UnitId::sheet("Y"),
    )))
    .unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_sheetwise"))
        .arg("decide")
        .arg("--project")
        .arg(&manifest)
        .arg("--edit")
        .arg(&edit)
        .output()
        .expect("Failed to execute sheetwise");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let actions: Vec<Action> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(actions.len(), 2);
    assert!(matches!(&actions[0], Action::BumpTimestamp { sheet, .. } if sheet == "Y"));
    assert_eq!(actions[1], Action::ScheduleRecompile(UnitId::sheet("Y")));
}

#[test]
fn test_cli_analyze_and_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    let manifest = dir.path().join("project.toml");
    std::fs::write(&manifest, MANIFEST).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sheetwise"))
        .args(["analyze", "--scene", "A", "--project"])
        .arg(&manifest)
        .output()
        .expect("Failed to execute sheetwise");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scene A reaches 2 sheet(s)"));
    assert!(stdout.contains("X\towner=A\tinline in scene A"));
    assert!(stdout.contains("Y\towner=-\tindependent"));

    let output = Command::new(env!("CARGO_BIN_EXE_sheetwise"))
        .args(["analyze", "--scene", "Missing", "--project"])
        .arg(&manifest)
        .output()
        .expect("Failed to execute sheetwise");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("scene:Missing not found"));
}
