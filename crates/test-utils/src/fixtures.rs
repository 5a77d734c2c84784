#![allow(dead_code)]

use wbsched::engine::Project;
use wbsched::ids::ActivityIdAllocator;
use wbsched::model::NewTask;
use wbsched::types::{RelationType, TaskId};

use crate::{date, wbs};

/// A project plus the allocator its tasks draw from.
pub struct ProjectFixture {
    pub project: Project,
    pub ids: ActivityIdAllocator,
}

impl ProjectFixture {
    pub fn new(id: &str) -> Self {
        Self {
            project: Project::new(id, id),
            ids: ActivityIdAllocator::new(),
        }
    }

    /// Add a task below the parent implied by its code.
    pub fn task(&mut self, code: &str, start: &str, end: &str) -> TaskId {
        self.task_with(NewTask::new(wbs(code), format!("Task {code}"), date(start), date(end)))
    }

    pub fn costed(&mut self, code: &str, labor: f64, material: f64, other: f64) -> TaskId {
        self.task_with(
            NewTask::new(wbs(code), format!("Task {code}"), date("2024-01-01"), date("2024-01-31"))
                .with_costs(labor, material, other),
        )
    }

    pub fn milestone(&mut self, code: &str, day: &str) -> TaskId {
        self.task_with(NewTask::new(wbs(code), format!("Milestone {code}"), date(day), date(day)).milestone())
    }

    pub fn task_with(&mut self, fields: NewTask) -> TaskId {
        let parent = fields.wbs_code.parent();
        self.project
            .create_task(&mut self.ids, parent.as_ref(), fields)
            .expect("fixture task must be valid")
            .id
    }

    pub fn relate(&mut self, p: TaskId, s: TaskId, ty: RelationType, lag: i64) {
        self.project
            .create_relation(p, s, ty, lag)
            .expect("fixture relation must be valid");
    }

    /// Root `1` and the chain `1.1 -> 1.1.1 -> 1.1.1.1`, returning the
    /// level-3 task as the parent for work packages.
    pub fn with_chain_to_level3(&mut self) -> TaskId {
        self.task("1", "2024-01-01", "2024-12-31");
        self.task("1.1", "2024-01-01", "2024-12-31");
        self.task("1.1.1", "2024-01-01", "2024-12-31");
        self.task("1.1.1.1", "2024-01-01", "2024-12-31")
    }
}
