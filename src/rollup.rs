// src/rollup.rs

//! Bottom-up budget rollup over the WBS tree.
//!
//! `budget_rollup(T)` is the sum of `total_cost` over every task in T's
//! subtree (T included) whose level is at least 4. Tasks above the work
//! package tier only aggregate their children.
//!
//! The engine never writes to the store. It returns a [`RollupPlan`] that
//! the project aggregate commits together with the schedule.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::errors::RecomputeError;
use crate::model::Task;
use crate::store::TaskStore;
use crate::types::TaskId;
use crate::wbs::WORK_PACKAGE_LEVEL;

/// Which tasks a rollup pass starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupScope {
    /// Only subtrees under the top-most dirty tasks.
    Dirty,
    /// Every root of the tree, regardless of dirty marks.
    All,
}

/// Recomputed rollups, keyed by task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupPlan {
    pub values: BTreeMap<TaskId, f64>,
    /// Top-most tasks each traversal started from.
    pub roots: Vec<TaskId>,
}

impl RollupPlan {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug)]
pub struct RollupEngine<'a> {
    tasks: &'a TaskStore,
}

impl<'a> RollupEngine<'a> {
    pub fn new(tasks: &'a TaskStore) -> Self {
        Self { tasks }
    }

    /// Compute new rollups for the given scope.
    ///
    /// Fails with `BrokenHierarchy` if any task in scope points at a parent
    /// that is missing or not exactly one level up. Nothing is returned
    /// for the other subtrees in that case.
    pub fn plan(&self, scope: RollupScope) -> Result<RollupPlan, RecomputeError> {
        let candidates: BTreeSet<TaskId> = match scope {
            RollupScope::Dirty => self.tasks.dirty_tasks().collect(),
            RollupScope::All => self.tasks.iter().map(|t| t.id).collect(),
        };

        if candidates.is_empty() {
            debug!("rollup: nothing to recompute");
            return Ok(RollupPlan::default());
        }

        let mut roots = Vec::new();
        for id in &candidates {
            let Some(task) = self.tasks.get(*id) else {
                continue;
            };
            match task.parent_id {
                None => roots.push(*id),
                Some(pid) => {
                    self.check_parent_link(task, pid)?;
                    if !candidates.contains(&pid) {
                        roots.push(*id);
                    }
                }
            }
        }

        let mut values = BTreeMap::new();
        for root in &roots {
            self.post_order_sum(*root, &mut values)?;
        }

        debug!(
            roots = roots.len(),
            updated = values.len(),
            "rollup: plan computed"
        );
        Ok(RollupPlan { values, roots })
    }

    fn check_parent_link(&self, task: &Task, parent_id: TaskId) -> Result<(), RecomputeError> {
        let broken = RecomputeError::BrokenHierarchy {
            task: task.id,
            parent: parent_id,
        };
        let Some(parent) = self.tasks.get(parent_id) else {
            warn!(task = %task.id, parent = %parent_id, "rollup: dangling parent reference");
            return Err(broken);
        };
        if parent.level + 1 != task.level {
            warn!(
                task = %task.id,
                parent = %parent_id,
                task_level = task.level,
                parent_level = parent.level,
                "rollup: parent level does not match"
            );
            return Err(broken);
        }
        Ok(())
    }

    /// Iterative post-order walk of the subtree at `root`.
    fn post_order_sum(
        &self,
        root: TaskId,
        values: &mut BTreeMap<TaskId, f64>,
    ) -> Result<(), RecomputeError> {
        let mut stack: Vec<(TaskId, bool)> = vec![(root, false)];

        while let Some((id, children_done)) = stack.pop() {
            let Some(task) = self.tasks.get(id) else {
                continue;
            };

            if !children_done {
                stack.push((id, true));
                for child_id in self.tasks.child_ids(id) {
                    if let Some(child) = self.tasks.get(child_id) {
                        self.check_parent_link(child, id)?;
                    }
                    stack.push((child_id, false));
                }
                continue;
            }

            let own = if task.level >= WORK_PACKAGE_LEVEL {
                task.total_cost()
            } else {
                0.0
            };
            let from_children: f64 = self
                .tasks
                .child_ids(id)
                .map(|c| values.get(&c).copied().unwrap_or(0.0))
                .sum();
            values.insert(id, own + from_children);
        }

        Ok(())
    }
}
