// src/config/model.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::RelationType;
use crate::wbs::WbsCode;

/// Project seed file as read from TOML.
///
/// ```toml
/// [project]
/// id = "bridge"
/// name = "Bridge refurbishment"
///
/// [config]
/// default_resource_unit = "day"
/// reject_slips = false
///
/// [[task]]
/// wbs = "1"
/// title = "Bridge"
/// start = "2024-01-01"
/// end = "2024-06-30"
///
/// [[relation]]
/// predecessor = "1.1.1.1"
/// successor = "1.1.1.2"
/// type = "FS"
/// lag = 2
/// ```
///
/// Relations refer to tasks by WBS code. Validation into a [`ProjectFile`]
/// happens in `config::validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProjectFile {
    pub project: ProjectSection,

    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub task: Vec<SeedTask>,

    #[serde(default)]
    pub relation: Vec<SeedRelation>,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub id: String,
    /// Display name; falls back to `id`.
    #[serde(default)]
    pub name: Option<String>,
}

impl ProjectSection {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Unit given to `resource_qty` when a seed task leaves it out.
    #[serde(default = "default_resource_unit")]
    pub default_resource_unit: String,

    /// Treat any schedule slip reported by the recompute as a failure.
    #[serde(default)]
    pub reject_slips: bool,
}

fn default_resource_unit() -> String {
    "day".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            default_resource_unit: default_resource_unit(),
            reject_slips: false,
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTask {
    pub wbs: WbsCode,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub cost_labor: f64,
    #[serde(default)]
    pub cost_material: f64,
    #[serde(default)]
    pub cost_other: f64,
    #[serde(default)]
    pub resource_role: Option<String>,
    #[serde(default)]
    pub resource_qty: Option<f64>,
    #[serde(default)]
    pub resource_unit: Option<String>,
    #[serde(default)]
    pub role_hours: BTreeMap<String, f64>,
}

/// One `[[relation]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRelation {
    pub predecessor: WbsCode,
    pub successor: WbsCode,
    #[serde(rename = "type", default = "default_relation_type")]
    pub relation_type: RelationType,
    #[serde(default)]
    pub lag: i64,
}

fn default_relation_type() -> RelationType {
    RelationType::FinishToStart
}

/// A validated seed file. Tasks are sorted by WBS code, so every parent
/// comes before its children.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub project: ProjectSection,
    pub config: ConfigSection,
    pub tasks: Vec<SeedTask>,
    pub relations: Vec<SeedRelation>,
}

impl ProjectFile {
    /// Build without validation. Callers must have run the checks in
    /// `config::validate`.
    pub(crate) fn new_unchecked(raw: RawProjectFile) -> Self {
        let mut tasks = raw.task;
        tasks.sort_by(|a, b| a.wbs.cmp(&b.wbs));
        Self {
            project: raw.project,
            config: raw.config,
            tasks,
            relations: raw.relation,
        }
    }
}
