// src/engine/report.rs

//! Values returned to collaborators by the project aggregate and service.

use chrono::NaiveDate;

use crate::dag::Advisory;
use crate::types::TaskId;

/// Result of a successful recompute pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeReport {
    /// Number of tasks whose `budget_rollup` was recomputed.
    pub rollups_updated: usize,
    /// Number of tasks that received scheduler output.
    pub schedule_updated: usize,
    /// Zero-float tasks in topological order.
    pub critical_path: Vec<TaskId>,
    pub advisories: Vec<Advisory>,
    pub project_finish: Option<NaiveDate>,
}

impl RecomputeReport {
    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectSummary {
    pub total_tasks: usize,
    pub level4_plus_count: usize,
    pub total_budget_from_level4_plus: f64,
}
