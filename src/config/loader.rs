// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::Result;

/// Load a project seed file and return the raw `RawProjectFile`.
///
/// This only performs TOML deserialization (WBS codes and dates are parsed
/// by serde). Use [`load_and_validate`] for the cross-entry checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw = parse_str(&contents)?;
    debug!(?path, tasks = raw.task.len(), relations = raw.relation.len(), "project file read");
    Ok(raw)
}

pub fn parse_str(contents: &str) -> Result<RawProjectFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a project seed file and run validation.
///
/// Checks for:
/// - duplicate WBS codes and missing parents,
/// - relations to unknown tasks and self-relations,
/// - relation cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let raw = load_from_path(&path)?;
    ProjectFile::try_from(raw)
}

/// `Project.toml` in the current working directory.
pub fn default_project_path() -> PathBuf {
    PathBuf::from("Project.toml")
}
