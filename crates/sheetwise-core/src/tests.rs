//! Unit tests for sheetwise-core

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::test_utils::{cyclic_project, nested_tree, project_with, two_scene_project};
use crate::*;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_unit_id_parsing() {
    assert_eq!("scene:Level 1".parse::<UnitId>().unwrap(), UnitId::scene("Level 1"));
    assert_eq!("sheet:Common".parse::<UnitId>().unwrap(), UnitId::sheet("Common"));
    assert!(matches!(
        "layout:Foo".parse::<UnitId>(),
        Err(GraphError::InvalidUnitId(_))
    ));
    assert!("scene:".parse::<UnitId>().is_err());
    assert_eq!(UnitId::sheet("Common").to_string(), "sheet:Common");
}

#[test]
fn test_scene_and_sheet_names_do_not_collide() {
    let mut project = Project::new();
    project.add_scene("Menu", EventTree::default()).unwrap();
    project.add_sheet("Menu", EventTree::default()).unwrap();
    assert!(project.contains(&UnitId::scene("Menu")));
    assert!(project.contains(&UnitId::sheet("Menu")));
    assert_eq!(
        project.add_scene("Menu", EventTree::default()),
        Err(GraphError::Duplicate(UnitId::scene("Menu")))
    );
}

#[test]
fn test_inclusion_references_walk_nested_events() {
    let tree = nested_tree(&["A", "B", "C", "A"]);
    assert_eq!(tree.inclusion_references(), vec!["A", "B", "C"]);
    assert!(EventTree::default().inclusion_references().is_empty());
}

#[test]
fn test_transitive_dependencies() {
    let project = project_with(
        &[("Game", &["Hud"]), ("Menu", &[])],
        &[("Hud", &["Widgets"]), ("Widgets", &["Math"]), ("Math", &[])],
    );
    let graph = DependencyGraphBuilder::analyze(&project, "Game").unwrap();
    assert_eq!(
        graph.external_dependencies_of("Game").unwrap(),
        &set(&["Hud", "Widgets", "Math"])
    );
    assert!(graph.external_dependencies_of("Menu").unwrap().is_empty());
    assert_eq!(graph.inclusion_count(), 3);
}

#[test]
fn test_exclusive_owner_with_zero_one_and_two_scenes() {
    let project = project_with(
        &[("A", &["Mine", "Shared"]), ("B", &["Shared"])],
        &[("Mine", &[]), ("Shared", &[]), ("Orphan", &[])],
    );
    let graph = DependencyGraphBuilder::build(&project).unwrap();

    assert_eq!(graph.exclusive_owner_of("Mine").unwrap(), Some("A"));
    assert_eq!(graph.exclusive_owner_of("Shared").unwrap(), None);
    assert_eq!(graph.exclusive_owner_of("Orphan").unwrap(), None);
}

#[test]
fn test_exclusive_owner_through_sheet_chain() {
    // B reaches Leaf only through Mid, which still makes Leaf shared.
    let project = project_with(
        &[("A", &["Leaf"]), ("B", &["Mid"])],
        &[("Mid", &["Leaf"]), ("Leaf", &[])],
    );
    let graph = DependencyGraphBuilder::build(&project).unwrap();
    assert_eq!(graph.exclusive_owner_of("Mid").unwrap(), Some("B"));
    assert_eq!(graph.exclusive_owner_of("Leaf").unwrap(), None);
    assert_eq!(graph.scenes_reaching("Leaf").unwrap(), vec!["A", "B"]);
    assert_eq!(graph.sheets_reaching("Leaf").unwrap(), vec!["Mid"]);
    assert_eq!(graph.sheet_dependencies_of("Mid").unwrap(), vec!["Leaf"]);
    assert!(graph.sheet_dependencies_of("Leaf").unwrap().is_empty());
}

#[test]
fn test_exclusivity_matches_reachability_for_many_layouts() {
    // Each scene i includes sheets i and i+1: the first and last sheets
    // are exclusive, the others shared by two scenes.
    for n in 1..=5usize {
        let mut project = Project::new();
        for i in 0..n {
            let includes = [format!("E{i}"), format!("E{}", i + 1)];
            project
                .add_scene(format!("S{i}"), EventTree::including(includes))
                .unwrap();
        }
        for i in 0..=n {
            project.add_sheet(format!("E{i}"), EventTree::default()).unwrap();
        }
        let graph = DependencyGraphBuilder::build(&project).unwrap();

        for i in 0..=n {
            let sheet = format!("E{i}");
            let reaching = graph.scenes_reaching(&sheet).unwrap();
            let expected = if reaching.len() == 1 { Some(reaching[0]) } else { None };
            assert_eq!(graph.exclusive_owner_of(&sheet).unwrap(), expected, "n={n} sheet={sheet}");
        }
    }
}

#[test]
fn test_cycles_terminate() {
    for k in [1usize, 2, 5] {
        let project = cyclic_project(k);
        let graph = DependencyGraphBuilder::analyze(&project, "Root").unwrap();
        let deps = graph.external_dependencies_of("Root").unwrap();
        assert_eq!(deps.len(), k, "k={k}");
        assert!(graph.has_cycles());
        assert_eq!(graph.cycles().len(), 1);
        assert_eq!(graph.cycles()[0].len(), k);
        // Every sheet in the loop is owned by the single scene.
        assert_eq!(graph.exclusive_owner_of("S0").unwrap(), Some("Root"));
    }
}

#[test]
fn test_self_include_is_reported_as_cycle() {
    let project = project_with(&[("Main", &["Loop"])], &[("Loop", &["Loop"])]);
    let graph = DependencyGraphBuilder::build(&project).unwrap();
    assert_eq!(graph.cycles(), &[vec![UnitId::sheet("Loop")]]);
    assert_eq!(graph.external_dependencies_of("Main").unwrap(), &set(&["Loop"]));
    assert!(graph.sheets_reaching("Loop").unwrap().is_empty());
}

#[test]
fn test_unknown_units_are_not_found() {
    let project = two_scene_project();
    assert_eq!(
        DependencyGraphBuilder::analyze(&project, "Nope").unwrap_err(),
        GraphError::NotFound(UnitId::scene("Nope"))
    );

    let graph = DependencyGraphBuilder::build(&project).unwrap();
    assert_eq!(
        graph.exclusive_owner_of("Nope").unwrap_err(),
        GraphError::NotFound(UnitId::sheet("Nope"))
    );
    assert!(graph.external_dependencies_of("X").is_err());
    assert!(graph.compiled_scope(&UnitId::scene("Z")).is_err());
}

#[test]
fn test_dangling_include_is_recorded_not_followed() {
    let project = project_with(&[("A", &["Ghost", "X"])], &[("X", &[])]);
    let graph = DependencyGraphBuilder::build(&project).unwrap();
    assert_eq!(graph.external_dependencies_of("A").unwrap(), &set(&["X"]));
    assert_eq!(
        graph.unresolved_references(),
        &[UnresolvedReference {
            from: UnitId::scene("A"),
            target: "Ghost".to_string(),
        }]
    );
}

#[test]
fn test_compiled_scope() {
    let project = two_scene_project();
    let graph = DependencyGraphBuilder::build(&project).unwrap();
    assert_eq!(
        graph.compiled_scope(&UnitId::sheet("X")).unwrap(),
        CompiledScope::Scene("A".to_string())
    );
    assert_eq!(
        graph.compiled_scope(&UnitId::sheet("Y")).unwrap(),
        CompiledScope::Independent("Y".to_string())
    );
    assert_eq!(
        graph.compiled_scope(&UnitId::scene("B")).unwrap(),
        CompiledScope::Scene("B".to_string())
    );
    assert!(graph.is_compiled_independently("Y").unwrap());
}

#[test]
fn test_generation_moves_only_on_inclusion_changes() {
    let mut project = two_scene_project();
    let start = project.generation();

    project
        .set_events(&UnitId::scene("A"), nested_tree(&["Y", "X"]))
        .unwrap();
    assert_eq!(project.generation(), start, "same inclusion set");

    project
        .set_events(&UnitId::scene("A"), EventTree::including(["Y"]))
        .unwrap();
    let dropped_x = project.generation();
    assert!(dropped_x > start);

    project.rename(&UnitId::sheet("X"), "X2").unwrap();
    assert!(project.generation() > dropped_x);
}

#[test]
fn test_diverging_clones_never_share_a_generation() {
    let mut original = two_scene_project();
    let mut copy = original.clone();
    assert_eq!(original.generation(), copy.generation());

    copy.set_events(&UnitId::scene("B"), EventTree::including(["X", "Y"]))
        .unwrap();
    original
        .set_events(&UnitId::scene("B"), EventTree::default())
        .unwrap();
    assert_ne!(original.generation(), copy.generation());

    // One cache serving both projects must not mix up their graphs.
    let cache = GraphCache::new();
    let shared = cache.get_or_build(&copy).unwrap();
    assert_eq!(shared.exclusive_owner_of("X").unwrap(), None);
    let owned = cache.get_or_build(&original).unwrap();
    assert_eq!(owned.exclusive_owner_of("X").unwrap(), Some("A"));
    assert_eq!(owned.exclusive_owner_of("Y").unwrap(), Some("A"));
}

#[test]
fn test_cache_reuses_until_generation_changes() {
    let mut project = two_scene_project();
    let cache = GraphCache::new();

    let first = cache.get_or_build(&project).unwrap();
    let second = cache.get_or_build(&project).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.exclusive_owner_of("X").unwrap(), Some("A"));

    // B now includes X too: the cached view must not be served.
    project
        .set_events(&UnitId::scene("B"), EventTree::including(["X", "Y"]))
        .unwrap();
    let third = cache.get_or_build(&project).unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!(third.exclusive_owner_of("X").unwrap(), None);
    assert_eq!(cache.cached_generation(), Some(project.generation()));

    cache.invalidate();
    assert_eq!(cache.cached_generation(), None);
}

#[test]
fn test_sinks_only_set_flags() {
    let mut project = two_scene_project();
    let a = UnitId::scene("A");
    assert_eq!(project.unit(&a).unwrap().state(), UnitState::Clean);

    project.set_refresh_needed(&a).unwrap();
    assert_eq!(project.unit(&a).unwrap().state(), UnitState::Dirty { compile: false });
    project.set_compilation_needed(&a).unwrap();
    assert_eq!(project.unit(&a).unwrap().state(), UnitState::Dirty { compile: true });

    project.enqueue_compilation(&a).unwrap();
    project.enqueue_compilation(&a).unwrap();
    assert_eq!(project.compilation_queue(), &[a.clone()]);

    project.mark_compiled(&a).unwrap();
    assert_eq!(project.unit(&a).unwrap().state(), UnitState::Clean);
}

#[test]
fn test_timestamp_never_moves_backwards() {
    let mut project = two_scene_project();
    project.bump_timestamp("Y", Timestamp(50)).unwrap();
    project.bump_timestamp("Y", Timestamp(20)).unwrap();
    assert_eq!(project.unit(&UnitId::sheet("Y")).unwrap().last_modified, Timestamp(50));
    assert!(project.bump_timestamp("A", Timestamp(1)).is_err());
}

#[test]
fn test_remove_and_rename_update_queue() {
    let mut project = two_scene_project();
    project.enqueue_compilation(&UnitId::sheet("Y")).unwrap();
    project.enqueue_compilation(&UnitId::scene("B")).unwrap();

    let renamed = project.rename(&UnitId::sheet("Y"), "Shared").unwrap();
    assert_eq!(renamed, UnitId::sheet("Shared"));
    project.remove(&UnitId::scene("B")).unwrap();
    assert_eq!(project.compilation_queue(), &[UnitId::sheet("Shared")]);
    assert!(project.remove(&UnitId::scene("B")).is_err());
}

#[test]
fn test_manual_clock_is_monotonic() {
    let clock = ManualClock::new(100);
    assert_eq!(clock.now(), Timestamp(100));
    assert_eq!(clock.now(), Timestamp(101));
    assert_eq!(clock.peek(), Timestamp(102));
    clock.set(500);
    assert_eq!(clock.now(), Timestamp(500));
    assert!(SystemClock.now() > Timestamp(0));
}

#[test]
fn test_unit_id_serialization() {
    let id = UnitId::sheet("Common");
    let json = serde_json::to_string(&id).unwrap();
    let back: UnitId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn test_graph_debug_output() {
    let graph = DependencyGraphBuilder::build(&two_scene_project()).unwrap();
    insta::assert_snapshot!(
        format!("{graph:?}"),
        @"DependencyGraph { node_count: 4, edge_count: 3, cycles: 0, unresolved: 0 }"
    );
}
