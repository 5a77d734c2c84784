#![allow(dead_code)]

use std::collections::BTreeMap;

use wbsched::config::{
    ConfigSection, ProjectFile, ProjectSection, RawProjectFile, SeedRelation, SeedTask,
};
use wbsched::types::RelationType;

use crate::{date, wbs};

/// Builder for `ProjectFile` to simplify test setup.
pub struct ProjectFileBuilder {
    raw: RawProjectFile,
}

impl ProjectFileBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            raw: RawProjectFile {
                project: ProjectSection {
                    id: id.to_string(),
                    name: None,
                },
                config: ConfigSection::default(),
                task: Vec::new(),
                relation: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.raw.project.name = Some(name.to_string());
        self
    }

    pub fn default_resource_unit(mut self, unit: &str) -> Self {
        self.raw.config.default_resource_unit = unit.to_string();
        self
    }

    pub fn reject_slips(mut self, val: bool) -> Self {
        self.raw.config.reject_slips = val;
        self
    }

    pub fn with_task(mut self, task: SeedTask) -> Self {
        self.raw.task.push(task);
        self
    }

    pub fn relation(mut self, predecessor: &str, successor: &str, ty: RelationType, lag: i64) -> Self {
        self.raw.relation.push(SeedRelation {
            predecessor: wbs(predecessor),
            successor: wbs(successor),
            relation_type: ty,
            lag,
        });
        self
    }

    pub fn raw(self) -> RawProjectFile {
        self.raw
    }

    pub fn build(self) -> ProjectFile {
        ProjectFile::try_from(self.raw).expect("Failed to build valid project file from builder")
    }
}

/// Builder for `SeedTask`.
pub struct SeedTaskBuilder {
    task: SeedTask,
}

impl SeedTaskBuilder {
    pub fn new(code: &str, start: &str, end: &str) -> Self {
        Self {
            task: SeedTask {
                wbs: wbs(code),
                title: format!("Task {code}"),
                description: None,
                start: date(start),
                end: date(end),
                milestone: false,
                cost_labor: 0.0,
                cost_material: 0.0,
                cost_other: 0.0,
                resource_role: None,
                resource_qty: None,
                resource_unit: None,
                role_hours: BTreeMap::new(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn costs(mut self, labor: f64, material: f64, other: f64) -> Self {
        self.task.cost_labor = labor;
        self.task.cost_material = material;
        self.task.cost_other = other;
        self
    }

    pub fn milestone(mut self) -> Self {
        self.task.milestone = true;
        self
    }

    pub fn resource(mut self, role: &str, qty: f64) -> Self {
        self.task.resource_role = Some(role.to_string());
        self.task.resource_qty = Some(qty);
        self
    }

    pub fn role_hours(mut self, role: &str, hours: f64) -> Self {
        self.task.role_hours.insert(role.to_string(), hours);
        self
    }

    pub fn build(self) -> SeedTask {
        self.task
    }
}
