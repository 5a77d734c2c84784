// src/persist/record.rs

//! Serialisable mirror of a project.
//!
//! Records are flat: costs and resourcing are spelled out field by field
//! and relation types use their literal tags (`"FS"`, `"SS"`, ...).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::Project;
use crate::errors::{ProjectError, StructuralError};
use crate::ids::ActivityIdAllocator;
use crate::model::task::validate_window;
use crate::model::{Costs, Resourcing, ScheduledDates, Task, TaskRelation};
use crate::store::{RelationStore, TaskStore};
use crate::types::{ProjectId, RelationId, RelationType, TaskId};
use crate::wbs::WbsCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskRecord>,
    #[serde(default, rename = "relation")]
    pub relations: Vec<RelationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub activity_id: String,
    pub wbs_code: WbsCode,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub cost_labor: f64,
    #[serde(default)]
    pub cost_material: f64,
    #[serde(default)]
    pub cost_other: f64,
    /// Written for readers of the file; recomputed from the parts on load.
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_qty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_unit: Option<String>,
    #[serde(default)]
    pub budget_rollup: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub role_hours: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduledDates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub id: RelationId,
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default)]
    pub lag: i64,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            activity_id: task.activity_id.clone(),
            wbs_code: task.wbs_code.clone(),
            level: task.level,
            parent_id: task.parent_id,
            title: task.title.clone(),
            description: task.description.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
            is_milestone: task.is_milestone,
            cost_labor: task.costs.labor(),
            cost_material: task.costs.material(),
            cost_other: task.costs.other(),
            total_cost: task.costs.total(),
            resource_role: task.resourcing.role.clone(),
            resource_qty: task.resourcing.qty,
            resource_unit: task.resourcing.unit.clone(),
            role_hours: task.resourcing.role_hours.clone(),
            budget_rollup: task.budget_rollup,
            schedule: task.schedule,
        }
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = ProjectError;

    fn try_from(rec: TaskRecord) -> Result<Self, Self::Error> {
        if rec.level != rec.wbs_code.level() {
            return Err(StructuralError::InvalidWbsCode(format!(
                "{} (stored level {} does not match)",
                rec.wbs_code, rec.level
            ))
            .into());
        }
        validate_window(rec.start_date, rec.end_date, rec.is_milestone)?;
        let costs = Costs::new(rec.cost_labor, rec.cost_material, rec.cost_other)?;
        costs.validate_for(&rec.wbs_code)?;
        let resourcing = Resourcing {
            role: rec.resource_role,
            qty: rec.resource_qty,
            unit: rec.resource_unit,
            role_hours: rec.role_hours,
        };
        resourcing.validate_for(&rec.wbs_code)?;

        Ok(Task {
            id: rec.id,
            activity_id: rec.activity_id,
            wbs_code: rec.wbs_code,
            level: rec.level,
            parent_id: rec.parent_id,
            title: rec.title,
            description: rec.description,
            start_date: rec.start_date,
            end_date: rec.end_date,
            is_milestone: rec.is_milestone,
            costs,
            resourcing,
            budget_rollup: rec.budget_rollup,
            schedule: rec.schedule,
        })
    }
}

impl From<&TaskRelation> for RelationRecord {
    fn from(rel: &TaskRelation) -> Self {
        Self {
            id: rel.id,
            predecessor_id: rel.predecessor_id,
            successor_id: rel.successor_id,
            relation_type: rel.relation_type,
            lag: rel.lag,
        }
    }
}

impl From<RelationRecord> for TaskRelation {
    fn from(rec: RelationRecord) -> Self {
        Self {
            id: rec.id,
            predecessor_id: rec.predecessor_id,
            successor_id: rec.successor_id,
            relation_type: rec.relation_type,
            lag: rec.lag,
        }
    }
}

impl ProjectRecord {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: project.id().to_string(),
            name: project.name().to_string(),
            tasks: project.tasks().iter().map(TaskRecord::from).collect(),
            relations: project
                .relations()
                .iter()
                .map(RelationRecord::from)
                .collect(),
        }
    }

    /// Rebuild the project and move `ids` past every stored activity id.
    ///
    /// Dangling parents and cyclic relations are accepted here and reported
    /// by the next recompute.
    pub fn into_project(self, ids: &mut ActivityIdAllocator) -> Result<Project, ProjectError> {
        let tasks = self
            .tasks
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        for task in &tasks {
            ids.resume_after(&task.activity_id);
        }

        let tasks = TaskStore::from_records(tasks)?;
        let relations = RelationStore::from_records(
            &tasks,
            self.relations.into_iter().map(TaskRelation::from).collect(),
        )?;

        Ok(Project::from_parts(self.id, self.name, tasks, relations))
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
