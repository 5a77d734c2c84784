// src/config/validate.rs

use std::collections::BTreeSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{Result, WbsError};
use crate::wbs::WbsCode;

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = WbsError;

    fn try_from(raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(raw))
    }
}

fn validate_raw_project(file: &RawProjectFile) -> Result<()> {
    validate_project_section(file)?;
    ensure_has_tasks(file)?;
    validate_task_tree(file)?;
    validate_relation_refs(file)?;
    validate_dag(file)?;
    Ok(())
}

fn validate_project_section(file: &RawProjectFile) -> Result<()> {
    if file.project.id.trim().is_empty() {
        return Err(WbsError::ConfigError(
            "[project].id must not be empty".to_string(),
        ));
    }
    if file.config.default_resource_unit.trim().is_empty() {
        return Err(WbsError::ConfigError(
            "[config].default_resource_unit must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn ensure_has_tasks(file: &RawProjectFile) -> Result<()> {
    if file.task.is_empty() {
        return Err(WbsError::ConfigError(
            "project file must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

/// Unique codes, and every non-root code has its parent in the file.
///
/// Dates, costs and resourcing are left to task creation, which reports
/// them with typed errors.
fn validate_task_tree(file: &RawProjectFile) -> Result<()> {
    let mut codes: BTreeSet<&WbsCode> = BTreeSet::new();
    for task in &file.task {
        if !codes.insert(&task.wbs) {
            return Err(WbsError::ConfigError(format!(
                "duplicate task with wbs '{}'",
                task.wbs
            )));
        }
    }

    for task in &file.task {
        if let Some(parent) = task.wbs.parent()
            && !codes.contains(&parent)
        {
            return Err(WbsError::ConfigError(format!(
                "task '{}' has no parent task '{}'",
                task.wbs, parent
            )));
        }
    }
    Ok(())
}

fn validate_relation_refs(file: &RawProjectFile) -> Result<()> {
    let codes: BTreeSet<&WbsCode> = file.task.iter().map(|t| &t.wbs).collect();

    for rel in &file.relation {
        for end in [&rel.predecessor, &rel.successor] {
            if !codes.contains(end) {
                return Err(WbsError::ConfigError(format!(
                    "relation {} -> {} refers to unknown task '{}'",
                    rel.predecessor, rel.successor, end
                )));
            }
        }
        if rel.predecessor == rel.successor {
            return Err(WbsError::ConfigError(format!(
                "task '{}' cannot depend on itself",
                rel.predecessor
            )));
        }
    }
    Ok(())
}

fn validate_dag(file: &RawProjectFile) -> Result<()> {
    // Edge direction: predecessor -> successor.
    let mut graph: DiGraphMap<&WbsCode, ()> = DiGraphMap::new();

    for task in &file.task {
        graph.add_node(&task.wbs);
    }
    for rel in &file.relation {
        graph.add_edge(&rel.predecessor, &rel.successor, ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(WbsError::ConfigError(format!(
            "cycle detected in relations involving task '{}'",
            cycle.node_id()
        ))),
    }
}
