//! Inclusion manifest: just enough of a project to analyze dependencies

use anyhow::{Context, Result};
use serde::Deserialize;
use sheetwise_core::{EventTree, Project};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub scenes: Vec<UnitEntry>,
    #[serde(default)]
    pub sheets: Vec<UnitEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    pub name: String,
    #[serde(default)]
    pub includes: Vec<String>,
}

impl Manifest {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid project manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest {}", path.display()))?;
        Self::parse(&source)
    }

    pub fn into_project(self) -> Result<Project> {
        let mut project = Project::new();
        for entry in self.scenes {
            project
                .add_scene(entry.name, EventTree::including(entry.includes))
                .context("duplicate scene in manifest")?;
        }
        for entry in self.sheets {
            project
                .add_sheet(entry.name, EventTree::including(entry.includes))
                .context("duplicate sheet in manifest")?;
        }
        Ok(project)
    }
}
