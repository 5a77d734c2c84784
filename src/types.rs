use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical project key type used by the service and repositories.
pub type ProjectId = String;

/// Opaque handle for a task inside one project.
///
/// Handles are allocated by the task store, never reused, and are the only
/// thing the tree index and the dependency graph refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Opaque handle for a relation inside one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub u64);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation#{}", self.0)
    }
}

/// Precedence type of a relation between a predecessor and a successor.
///
/// Persisted as the literal tags `"FS"`, `"SS"`, `"FF"` and `"SF"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// Successor starts after the predecessor finishes.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Successor starts after the predecessor starts.
    #[serde(rename = "SS")]
    StartToStart,
    /// Successor finishes after the predecessor finishes.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Successor finishes after the predecessor starts.
    #[serde(rename = "SF")]
    StartToFinish,
}

impl RelationType {
    pub fn tag(self) -> &'static str {
        match self {
            RelationType::FinishToStart => "FS",
            RelationType::StartToStart => "SS",
            RelationType::FinishToFinish => "FF",
            RelationType::StartToFinish => "SF",
        }
    }

    /// Which date of the predecessor the constraint is measured from.
    pub fn predecessor_anchor(self) -> DateField {
        match self {
            RelationType::FinishToStart | RelationType::FinishToFinish => DateField::End,
            RelationType::StartToStart | RelationType::StartToFinish => DateField::Start,
        }
    }

    /// Which date of the successor the constraint bounds.
    pub fn successor_anchor(self) -> DateField {
        match self {
            RelationType::FinishToStart | RelationType::StartToStart => DateField::Start,
            RelationType::FinishToFinish | RelationType::StartToFinish => DateField::End,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Ok(RelationType::FinishToStart),
            "SS" => Ok(RelationType::StartToStart),
            "FF" => Ok(RelationType::FinishToFinish),
            "SF" => Ok(RelationType::StartToFinish),
            other => Err(format!(
                "invalid relation type: {other} (expected \"FS\", \"SS\", \"FF\" or \"SF\")"
            )),
        }
    }
}

/// The start or end date of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Start,
    End,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Start => f.write_str("start"),
            DateField::End => f.write_str("end"),
        }
    }
}

/// Named cost or quantity field, used to report negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    CostLabor,
    CostMaterial,
    CostOther,
    ResourceQty,
    RoleHours,
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AmountField::CostLabor => "cost_labor",
            AmountField::CostMaterial => "cost_material",
            AmountField::CostOther => "cost_other",
            AmountField::ResourceQty => "resource_qty",
            AmountField::RoleHours => "role_hours",
        };
        f.write_str(name)
    }
}
