// src/engine/core.rs

//! Pure project aggregate.
//!
//! A [`Project`] owns one project's task store, relation store and
//! dependency graph, and runs the transactional recompute over them.
//!
//! It has no locks, no Tokio types and performs no IO. The async service
//! (`engine::service`) wraps it for concurrent callers.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::dag::{DependencyGraph, Scheduler};
use crate::engine::report::{ProjectSummary, RecomputeReport};
use crate::errors::{ProjectError, RelationError, StructuralError, TaskError};
use crate::ids::ActivityIdAllocator;
use crate::model::{NewTask, Resourcing, Task, TaskRelation};
use crate::rollup::{RollupEngine, RollupScope};
use crate::store::{RelationStore, TaskStore};
use crate::types::{ProjectId, RelationId, RelationType, TaskId};
use crate::wbs::WbsCode;

#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    name: String,
    tasks: TaskStore,
    relations: RelationStore,
    graph: DependencyGraph,
    /// Critical path as of the last committed recompute.
    critical_path: Vec<TaskId>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks: TaskStore::new(),
            relations: RelationStore::new(),
            graph: DependencyGraph::new(),
            critical_path: Vec::new(),
        }
    }

    /// Assemble a project from restored stores. The graph view is rebuilt
    /// from the relations.
    pub fn from_parts(
        id: impl Into<ProjectId>,
        name: impl Into<String>,
        tasks: TaskStore,
        relations: RelationStore,
    ) -> Self {
        let graph = DependencyGraph::from_relations(relations.iter());
        let critical_path = tasks
            .iter()
            .filter(|t| t.schedule().is_some_and(|s| s.critical))
            .map(|t| t.id)
            .collect();
        Self {
            id: id.into(),
            name: name.into(),
            tasks,
            relations,
            graph,
            critical_path,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_by_wbs(&self, code: &WbsCode) -> Option<&Task> {
        self.tasks.find_by_wbs(code)
    }

    /// Critical path of the last successful recompute.
    pub fn critical_path(&self) -> &[TaskId] {
        &self.critical_path
    }

    pub fn create_task(
        &mut self,
        ids: &mut ActivityIdAllocator,
        parent_wbs: Option<&WbsCode>,
        fields: NewTask,
    ) -> Result<Task, ProjectError> {
        let task = self.tasks.create_task(ids, parent_wbs, fields)?;
        debug!(project = %self.id, task = %task.id, "project: task added");
        Ok(task)
    }

    /// Add `predecessor -> successor`. Rejected relations leave the
    /// relation set and graph untouched.
    pub fn create_relation(
        &mut self,
        predecessor: TaskId,
        successor: TaskId,
        relation_type: RelationType,
        lag: i64,
    ) -> Result<TaskRelation, ProjectError> {
        self.relations
            .check_endpoints(&self.tasks, predecessor, successor)?;
        self.relations
            .check_not_duplicate(predecessor, successor, relation_type)?;

        if self.graph.would_create_cycle(predecessor, successor) {
            warn!(
                project = %self.id,
                %predecessor,
                %successor,
                "relation rejected: would create a cycle"
            );
            return Err(RelationError::CycleDetected {
                predecessor,
                successor,
            }
            .into());
        }

        let rel = self
            .relations
            .insert(predecessor, successor, relation_type, lag);
        self.graph.add_relation(&rel);
        Ok(rel)
    }

    pub fn delete_relation(&mut self, id: RelationId) -> Result<TaskRelation, ProjectError> {
        let rel = self.relations.remove(id)?;
        self.graph.remove_relation(&rel);
        Ok(rel)
    }

    /// Delete a task that has no children and no relations.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, ProjectError> {
        if !self.tasks.contains(id) {
            return Err(TaskError::NotFound(id).into());
        }
        if self.relations.involving(id).next().is_some() {
            return Err(StructuralError::HasRelations(id).into());
        }
        let task = self.tasks.delete_task(id)?;
        self.critical_path.retain(|t| *t != id);
        Ok(task)
    }

    pub fn update_cost_fields(
        &mut self,
        id: TaskId,
        labor: f64,
        material: f64,
        other: f64,
    ) -> Result<Task, ProjectError> {
        Ok(self
            .tasks
            .update_cost_fields(id, labor, material, other)?
            .clone())
    }

    pub fn update_dates(
        &mut self,
        id: TaskId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Task, ProjectError> {
        Ok(self.tasks.update_dates(id, start, end)?.clone())
    }

    pub fn update_resourcing(
        &mut self,
        id: TaskId,
        resourcing: Resourcing,
    ) -> Result<Task, ProjectError> {
        Ok(self.tasks.update_resourcing(id, resourcing)?.clone())
    }

    pub fn subtree(&self, id: TaskId) -> Result<Vec<&Task>, ProjectError> {
        Ok(self.tasks.subtree(id)?)
    }

    pub fn children(&self, id: TaskId) -> Result<Vec<&Task>, ProjectError> {
        Ok(self.tasks.children(id)?)
    }

    /// Recompute rollups for dirty subtrees and reschedule the whole graph.
    pub fn recompute(&mut self) -> Result<RecomputeReport, ProjectError> {
        self.recompute_with(RollupScope::Dirty)
    }

    /// Like [`recompute`](Self::recompute) but rolls up every subtree.
    pub fn recompute_full(&mut self) -> Result<RecomputeReport, ProjectError> {
        self.recompute_with(RollupScope::All)
    }

    /// Both engines plan against the current state. Derived fields are only
    /// written once both plans succeeded.
    fn recompute_with(&mut self, scope: RollupScope) -> Result<RecomputeReport, ProjectError> {
        let rollups = RollupEngine::new(&self.tasks).plan(scope)?;
        let schedule = Scheduler::new(&self.tasks, &self.graph).plan()?;

        self.tasks.apply_rollups(&rollups.values);
        self.tasks.apply_schedule(&schedule.dates);
        self.critical_path = schedule.critical_path.clone();

        let report = RecomputeReport {
            rollups_updated: rollups.len(),
            schedule_updated: schedule.dates.len(),
            critical_path: schedule.critical_path,
            advisories: schedule.advisories,
            project_finish: schedule.project_finish,
        };

        info!(
            project = %self.id,
            rollups = report.rollups_updated,
            scheduled = report.schedule_updated,
            critical = report.critical_path.len(),
            advisories = report.advisories.len(),
            "project recomputed"
        );
        Ok(report)
    }

    /// Counts and budget over work-package tasks, read from authored costs.
    pub fn summary(&self) -> ProjectSummary {
        let (count, budget) = self
            .tasks
            .iter()
            .filter(|t| t.is_work_package())
            .fold((0usize, 0.0f64), |(n, sum), t| (n + 1, sum + t.total_cost()));

        ProjectSummary {
            total_tasks: self.tasks.len(),
            level4_plus_count: count,
            total_budget_from_level4_plus: budget,
        }
    }
}
