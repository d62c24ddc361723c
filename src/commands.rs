//! CLI command implementations

use anyhow::Context;
use sheetwise_core::{CompiledScope, DependencyGraphBuilder};
use sheetwise_policy::{Edit, InvalidationPolicy, PolicyConfig};
use std::path::Path;

use crate::manifest::Manifest;

pub fn analyze(project_path: &Path, scene: &str) -> anyhow::Result<()> {
    let project = Manifest::load(project_path)?.into_project()?;
    let graph = DependencyGraphBuilder::analyze(&project, scene)?;
    let dependencies = graph.external_dependencies_of(scene)?;

    tracing::info!(
        "Analyzed {} ({} inclusions project-wide)",
        project_path.display(),
        graph.inclusion_count()
    );

    println!("scene {} reaches {} sheet(s)", scene, dependencies.len());
    for sheet in dependencies {
        let owner = graph.exclusive_owner_of(sheet)?.unwrap_or("-");
        let compiled = match graph.compiled_scope(&sheetwise_core::UnitId::sheet(sheet))? {
            CompiledScope::Scene(scene) => format!("inline in scene {scene}"),
            CompiledScope::Independent(_) => "independent".to_string(),
        };
        println!("  {sheet}\towner={owner}\t{compiled}");
    }

    for cycle in graph.cycles() {
        let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        println!("cycle: {}", names.join(", "));
    }
    for reference in graph.unresolved_references() {
        println!("unresolved: {} includes missing sheet {}", reference.from, reference.target);
    }
    Ok(())
}

pub fn decide(
    project_path: &Path,
    edit_json: &str,
    config_path: Option<&Path>,
    resolve: bool,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => PolicyConfig::load(path)?,
        None => PolicyConfig::default(),
    };
    let project = Manifest::load(project_path)?.into_project()?;
    let edit: Edit = serde_json::from_str(edit_json).context("invalid edit JSON")?;

    let policy = InvalidationPolicy::new(config);
    let mut actions = policy.decide(&project, &edit)?;
    if resolve {
        actions = policy.resolve(&project, actions)?;
    }

    tracing::info!("{} action(s)", actions.len());
    for action in &actions {
        println!("{}", serde_json::to_string(action)?);
    }
    Ok(())
}
