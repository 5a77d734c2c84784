// src/model/task.rs

//! Task record and its value types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{StructuralError, TaskError};
use crate::types::{AmountField, TaskId};
use crate::wbs::WbsCode;

/// Cost triple plus its derived total.
///
/// Fields are private so `total` can never drift from the sum of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Costs {
    labor: f64,
    material: f64,
    other: f64,
    total: f64,
}

impl Costs {
    pub fn new(labor: f64, material: f64, other: f64) -> Result<Self, TaskError> {
        check_amount(AmountField::CostLabor, labor)?;
        check_amount(AmountField::CostMaterial, material)?;
        check_amount(AmountField::CostOther, other)?;
        Ok(Self {
            labor,
            material,
            other,
            total: labor + material + other,
        })
    }

    pub fn labor(&self) -> f64 {
        self.labor
    }

    pub fn material(&self) -> f64 {
        self.material
    }

    pub fn other(&self) -> f64 {
        self.other
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Levels 0-3 only aggregate; their own cost triple must stay zero.
    pub(crate) fn validate_for(&self, code: &WbsCode) -> Result<(), TaskError> {
        if self.total != 0.0 && !code.is_work_package() {
            return Err(StructuralError::CostBelowWorkPackage {
                code: code.clone(),
                level: code.level(),
            }
            .into());
        }
        Ok(())
    }
}

/// Resource loading of a work package (level 4 and below).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resourcing {
    pub role: Option<String>,
    /// Quantity per day.
    pub qty: Option<f64>,
    /// Unit label for `qty`; required whenever `qty` is set.
    pub unit: Option<String>,
    /// Allocated hours per role name.
    pub role_hours: BTreeMap<String, f64>,
}

impl Resourcing {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.qty.is_none() && self.role_hours.is_empty()
    }

    /// Validate amounts and placement for a task with the given code.
    pub(crate) fn validate_for(&self, code: &WbsCode) -> Result<(), TaskError> {
        if self.is_empty() {
            return Ok(());
        }
        if !code.is_work_package() {
            return Err(StructuralError::ResourcingBelowWorkPackage {
                code: code.clone(),
                level: code.level(),
            }
            .into());
        }
        if let Some(qty) = self.qty {
            check_amount(AmountField::ResourceQty, qty)?;
            if self.unit.is_none() {
                return Err(StructuralError::MissingResourceUnit(code.clone()).into());
            }
        }
        for hours in self.role_hours.values() {
            check_amount(AmountField::RoleHours, *hours)?;
        }
        Ok(())
    }
}

/// Dates derived by the scheduler for a task that takes part in relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub late_start: NaiveDate,
    pub late_end: NaiveDate,
    pub total_float_days: i64,
    pub critical: bool,
}

/// A node in the WBS tree.
///
/// Stores only hand out shared references; every mutation goes through
/// the store so derived fields and dirty marks stay consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub activity_id: String,
    pub wbs_code: WbsCode,
    pub level: u32,
    pub parent_id: Option<TaskId>,
    pub title: String,
    pub description: Option<String>,
    /// Authored start date.
    pub start_date: NaiveDate,
    /// Authored end date.
    pub end_date: NaiveDate,
    pub is_milestone: bool,
    pub costs: Costs,
    pub resourcing: Resourcing,
    pub(crate) budget_rollup: f64,
    pub(crate) schedule: Option<ScheduledDates>,
}

impl Task {
    pub fn total_cost(&self) -> f64 {
        self.costs.total()
    }

    /// Sum of `total_cost` over level-4+ tasks in this task's subtree, as of
    /// the last recompute.
    pub fn budget_rollup(&self) -> f64 {
        self.budget_rollup
    }

    /// Scheduler output, if this task took part in the last recompute.
    pub fn schedule(&self) -> Option<&ScheduledDates> {
        self.schedule.as_ref()
    }

    /// Whole days from start to end of the authored window.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn is_work_package(&self) -> bool {
        self.wbs_code.is_work_package()
    }
}

/// Collaborator-supplied fields for a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub wbs_code: WbsCode,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_milestone: bool,
    pub cost_labor: f64,
    pub cost_material: f64,
    pub cost_other: f64,
    pub resourcing: Resourcing,
}

impl NewTask {
    pub fn new(
        wbs_code: WbsCode,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            wbs_code,
            title: title.into(),
            description: None,
            start_date,
            end_date,
            is_milestone: false,
            cost_labor: 0.0,
            cost_material: 0.0,
            cost_other: 0.0,
            resourcing: Resourcing::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_costs(mut self, labor: f64, material: f64, other: f64) -> Self {
        self.cost_labor = labor;
        self.cost_material = material;
        self.cost_other = other;
        self
    }

    pub fn milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    pub fn with_resourcing(mut self, resourcing: Resourcing) -> Self {
        self.resourcing = resourcing;
        self
    }
}

/// Date checks shared by creation and date updates.
pub(crate) fn validate_window(
    start: NaiveDate,
    end: NaiveDate,
    is_milestone: bool,
) -> Result<(), StructuralError> {
    if end < start {
        return Err(StructuralError::InvalidDates { start, end });
    }
    if is_milestone && start != end {
        return Err(StructuralError::MilestoneSpan { start, end });
    }
    Ok(())
}

fn check_amount(field: AmountField, value: f64) -> Result<(), TaskError> {
    if value.is_nan() || value < 0.0 {
        return Err(TaskError::NegativeAmount { field, value });
    }
    Ok(())
}
