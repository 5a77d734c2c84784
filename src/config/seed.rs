// src/config/seed.rs

//! Turn a validated [`ProjectFile`] into a [`Project`].

use tracing::{debug, info};

use crate::config::model::{ProjectFile, SeedTask};
use crate::engine::Project;
use crate::errors::{Result, WbsError};
use crate::ids::ActivityIdAllocator;
use crate::model::{NewTask, Resourcing};
use crate::wbs::WbsCode;

/// Create every task (parents first) and then every relation.
///
/// Activity IDs are drawn from `ids` in WBS order. Task- and relation-level
/// violations come back as the typed project errors.
pub fn build_project(file: &ProjectFile, ids: &mut ActivityIdAllocator) -> Result<Project> {
    let mut project = Project::new(file.project.id.clone(), file.project.display_name());

    for seed in &file.tasks {
        let fields = new_task_from_seed(seed, &file.config.default_resource_unit);
        let parent = seed.wbs.parent();
        let task = project.create_task(ids, parent.as_ref(), fields)?;
        debug!(wbs = %task.wbs_code, activity_id = %task.activity_id, "seeded task");
    }

    for rel in &file.relations {
        let lookup = |code: &WbsCode| {
            project
                .task_by_wbs(code)
                .map(|t| t.id)
                .ok_or_else(|| WbsError::ConfigError(format!("unknown task '{code}' in relation")))
        };
        let predecessor = lookup(&rel.predecessor)?;
        let successor = lookup(&rel.successor)?;
        project.create_relation(predecessor, successor, rel.relation_type, rel.lag)?;
    }

    info!(
        project = %project.id(),
        tasks = project.tasks().len(),
        relations = project.relations().len(),
        "project seeded"
    );
    Ok(project)
}

fn new_task_from_seed(seed: &SeedTask, default_unit: &str) -> NewTask {
    let unit = match (&seed.resource_unit, seed.resource_qty) {
        (Some(unit), _) => Some(unit.clone()),
        (None, Some(_)) => Some(default_unit.to_string()),
        (None, None) => None,
    };
    let resourcing = Resourcing {
        role: seed.resource_role.clone(),
        qty: seed.resource_qty,
        unit,
        role_hours: seed.role_hours.clone(),
    };

    let mut fields = NewTask::new(seed.wbs.clone(), seed.title.clone(), seed.start, seed.end)
        .with_costs(seed.cost_labor, seed.cost_material, seed.cost_other)
        .with_resourcing(resourcing);
    if let Some(description) = &seed.description {
        fields = fields.with_description(description.clone());
    }
    if seed.milestone {
        fields = fields.milestone();
    }
    fields
}
