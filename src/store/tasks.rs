// src/store/tasks.rs

//! Task store: the canonical task set and the WBS tree index.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::errors::{StructuralError, TaskError};
use crate::ids::ActivityIdAllocator;
use crate::model::task::validate_window;
use crate::model::{Costs, NewTask, Resourcing, ScheduledDates, Task};
use crate::types::TaskId;
use crate::wbs::WbsCode;

/// Owns every task of one project plus the indices over them.
///
/// - `by_wbs` keeps WBS codes unique and gives WBS-ordered iteration.
/// - `children` is the tree index, children ordered by WBS code.
/// - `dirty` holds tasks whose `budget_rollup` is stale. A dirty task's
///   ancestors are always dirty too.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    by_wbs: BTreeMap<WbsCode, TaskId>,
    children: BTreeMap<TaskId, BTreeMap<WbsCode, TaskId>>,
    dirty: BTreeSet<TaskId>,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Rebuild a store from persisted tasks.
    ///
    /// Duplicate ids or WBS codes are rejected. Parent references are not
    /// checked here: a dangling parent is reported as `BrokenHierarchy` by
    /// the next recompute. Every loaded task starts dirty.
    pub fn from_records(tasks: Vec<Task>) -> Result<Self, TaskError> {
        let mut store = Self::new();

        for task in tasks {
            if store.tasks.contains_key(&task.id) {
                return Err(StructuralError::DuplicateTaskId(task.id).into());
            }
            if store.by_wbs.contains_key(&task.wbs_code) {
                return Err(StructuralError::DuplicateWbsCode(task.wbs_code.clone()).into());
            }
            store.next_id = store.next_id.max(task.id.0 + 1);
            store.by_wbs.insert(task.wbs_code.clone(), task.id);
            store.dirty.insert(task.id);
            store.tasks.insert(task.id, task);
        }

        let links: Vec<(TaskId, TaskId, WbsCode)> = store
            .tasks
            .values()
            .filter_map(|t| t.parent_id.map(|p| (p, t.id, t.wbs_code.clone())))
            .collect();
        for (parent, child, code) in links {
            if store.tasks.contains_key(&parent) {
                store.children.entry(parent).or_default().insert(code, child);
            }
        }

        debug!(tasks = store.tasks.len(), "task store restored from records");
        Ok(store)
    }

    /// Create a task below `parent_wbs` (or as a root when `None`).
    ///
    /// All checks run before anything is written, and the activity ID is
    /// only drawn once the task is known to be valid.
    pub fn create_task(
        &mut self,
        ids: &mut ActivityIdAllocator,
        parent_wbs: Option<&WbsCode>,
        fields: NewTask,
    ) -> Result<Task, TaskError> {
        let code = fields.wbs_code.clone();

        if self.by_wbs.contains_key(&code) {
            return Err(StructuralError::DuplicateWbsCode(code).into());
        }

        let parent_id = match parent_wbs {
            None => {
                if code.level() != 0 {
                    return Err(StructuralError::InvalidParent(format!(
                        "'{code}' is not a root code and needs a parent"
                    ))
                    .into());
                }
                None
            }
            Some(parent_code) => {
                let parent_id = *self.by_wbs.get(parent_code).ok_or_else(|| {
                    StructuralError::InvalidParent(format!("no task with WBS code '{parent_code}'"))
                })?;
                if !parent_code.is_strict_prefix_of(&code) {
                    return Err(StructuralError::InvalidParent(format!(
                        "'{parent_code}' is not a prefix of '{code}'"
                    ))
                    .into());
                }
                if !code.is_child_of(parent_code) {
                    return Err(StructuralError::LevelMismatch {
                        code,
                        parent: parent_code.clone(),
                    }
                    .into());
                }
                Some(parent_id)
            }
        };

        validate_window(fields.start_date, fields.end_date, fields.is_milestone)?;
        let costs = Costs::new(fields.cost_labor, fields.cost_material, fields.cost_other)?;
        costs.validate_for(&code)?;
        fields.resourcing.validate_for(&code)?;

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let task = Task {
            id,
            activity_id: ids.next(),
            level: code.level(),
            wbs_code: code.clone(),
            parent_id,
            title: fields.title,
            description: fields.description,
            start_date: fields.start_date,
            end_date: fields.end_date,
            is_milestone: fields.is_milestone,
            costs,
            resourcing: fields.resourcing,
            budget_rollup: 0.0,
            schedule: None,
        };

        self.by_wbs.insert(code.clone(), id);
        if let Some(pid) = parent_id {
            self.children.entry(pid).or_default().insert(code, id);
        }
        self.tasks.insert(id, task.clone());
        self.mark_dirty_upwards(id);

        info!(
            task = %id,
            activity_id = %task.activity_id,
            wbs = %task.wbs_code,
            "task created"
        );
        Ok(task)
    }

    /// Replace the cost triple; `total_cost` is updated in the same write.
    pub fn update_cost_fields(
        &mut self,
        id: TaskId,
        labor: f64,
        material: f64,
        other: f64,
    ) -> Result<&Task, TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        let costs = Costs::new(labor, material, other)?;
        costs.validate_for(&task.wbs_code)?;
        task.costs = costs;
        debug!(task = %id, total = costs.total(), "cost fields updated");

        self.mark_dirty_upwards(id);
        self.get(id).ok_or(TaskError::NotFound(id))
    }

    /// Replace the authored dates.
    pub fn update_dates(
        &mut self,
        id: TaskId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<&Task, TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        validate_window(start, end, task.is_milestone)?;
        task.start_date = start;
        task.end_date = end;
        debug!(task = %id, %start, %end, "authored dates updated");
        Ok(task)
    }

    pub fn update_resourcing(
        &mut self,
        id: TaskId,
        resourcing: Resourcing,
    ) -> Result<&Task, TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        resourcing.validate_for(&task.wbs_code)?;
        task.resourcing = resourcing;
        Ok(task)
    }

    /// Remove a leaf task. Tasks with children are refused; callers must
    /// delete the children first.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        if !self.tasks.contains_key(&id) {
            return Err(TaskError::NotFound(id));
        }
        if self.children.get(&id).is_some_and(|c| !c.is_empty()) {
            return Err(StructuralError::HasChildren(id).into());
        }

        // Mark before unlinking so the walk can still reach the ancestors.
        self.mark_dirty_upwards(id);

        let task = self.tasks.remove(&id).ok_or(TaskError::NotFound(id))?;
        self.by_wbs.remove(&task.wbs_code);
        self.children.remove(&id);
        self.dirty.remove(&id);
        if let Some(siblings) = task.parent_id.and_then(|p| self.children.get_mut(&p)) {
            siblings.remove(&task.wbs_code);
        }

        info!(task = %id, wbs = %task.wbs_code, "task deleted");
        Ok(task)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn find_by_wbs(&self, code: &WbsCode) -> Option<&Task> {
        self.by_wbs.get(code).and_then(|id| self.tasks.get(id))
    }

    pub fn find_by_activity_id(&self, activity_id: &str) -> Option<&Task> {
        self.tasks.values().find(|t| t.activity_id == activity_id)
    }

    /// All tasks in ascending WBS order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.by_wbs.values().filter_map(|id| self.tasks.get(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Direct children in WBS order.
    pub fn children(&self, id: TaskId) -> Result<Vec<&Task>, TaskError> {
        if !self.tasks.contains_key(&id) {
            return Err(TaskError::NotFound(id));
        }
        Ok(self
            .child_ids(id)
            .filter_map(|c| self.tasks.get(&c))
            .collect())
    }

    /// The subtree rooted at `id`, pre-order, siblings in WBS order.
    pub fn subtree(&self, id: TaskId) -> Result<Vec<&Task>, TaskError> {
        if !self.tasks.contains_key(&id) {
            return Err(TaskError::NotFound(id));
        }

        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(task) = self.tasks.get(&current) {
                out.push(task);
            }
            let kids: Vec<TaskId> = self.child_ids(current).collect();
            stack.extend(kids.into_iter().rev());
        }
        Ok(out)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: TaskId) -> Result<Vec<&Task>, TaskError> {
        let task = self.tasks.get(&id).ok_or(TaskError::NotFound(id))?;
        let mut out = Vec::new();
        let mut current = task.parent_id;
        while let Some(pid) = current {
            match self.tasks.get(&pid) {
                Some(parent) => {
                    out.push(parent);
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        Ok(out)
    }

    pub fn is_dirty(&self, id: TaskId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn dirty_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.dirty.iter().copied()
    }

    pub(crate) fn child_ids(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flat_map(|kids| kids.values().copied())
    }

    /// Write recomputed rollups and clear their dirty marks.
    pub(crate) fn apply_rollups(&mut self, rollups: &BTreeMap<TaskId, f64>) {
        for (id, value) in rollups {
            if let Some(task) = self.tasks.get_mut(id) {
                task.budget_rollup = *value;
            }
            self.dirty.remove(id);
        }
    }

    /// Replace every task's scheduler output. Tasks missing from `dates`
    /// no longer take part in relations and lose their schedule.
    pub(crate) fn apply_schedule(&mut self, dates: &BTreeMap<TaskId, ScheduledDates>) {
        for task in self.tasks.values_mut() {
            task.schedule = dates.get(&task.id).copied();
        }
    }

    fn mark_dirty_upwards(&mut self, id: TaskId) {
        let mut current = Some(id);
        while let Some(c) = current {
            if !self.dirty.insert(c) {
                // Already dirty, so every ancestor is too.
                break;
            }
            current = self.tasks.get(&c).and_then(|t| t.parent_id);
        }
    }
}
