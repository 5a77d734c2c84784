// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod model;
pub mod persist;
pub mod rollup;
pub mod store;
pub mod types;
pub mod wbs;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ProjectFile;
use crate::engine::{ProjectService, ProjectSummary, RecomputeReport};
use crate::persist::{FileRepository, ProjectRecord};
use crate::types::TaskId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project file loading and validation
/// - seeding through the project service
/// - one recompute and the printed report
/// - (optional) saving into a file repository
pub async fn run(args: CliArgs) -> Result<()> {
    let file = load_and_validate(&args.project)?;

    if args.dry_run {
        print_dry_run(&file);
        return Ok(());
    }

    let service = match &args.output {
        Some(dir) => ProjectService::new(Arc::new(FileRepository::new(dir.clone()))),
        None => ProjectService::in_memory(),
    };

    let id = service.seed(&file).await?;
    let report = service.recompute_project(&id).await?;
    let summary = service.get_project_summary(&id).await?;
    let record = service.snapshot(&id).await?;

    print_report(&record, &report, &summary);

    if let Some(dir) = &args.output {
        service.save_project(&id).await?;
        info!(project = %id, ?dir, "recomputed project written");
    }

    if file.config.reject_slips && report.has_advisories() {
        bail!(
            "{} schedule slip(s) reported and [config].reject_slips is set",
            report.advisories.len()
        );
    }
    Ok(())
}

fn print_report(record: &ProjectRecord, report: &RecomputeReport, summary: &ProjectSummary) {
    let labels: BTreeMap<TaskId, String> = record
        .tasks
        .iter()
        .map(|t| (t.id, format!("{} {} ({})", t.activity_id, t.wbs_code, t.title)))
        .collect();
    let label = |id: &TaskId| labels.get(id).cloned().unwrap_or_else(|| id.to_string());

    println!("wbsched: {} ({})", record.name, record.id);
    println!("  tasks: {}", summary.total_tasks);
    println!("  work packages (level >= 4): {}", summary.level4_plus_count);
    println!(
        "  budget from work packages: {:.2}",
        summary.total_budget_from_level4_plus
    );
    if let Some(finish) = report.project_finish {
        println!("  scheduled finish: {finish}");
    }
    println!();

    println!("budget rollup:");
    for task in &record.tasks {
        let indent = "  ".repeat(task.level as usize + 1);
        println!("{indent}{} {}: {:.2}", task.wbs_code, task.title, task.budget_rollup);
    }
    println!();

    if report.critical_path.is_empty() {
        println!("critical path: (no relations)");
    } else {
        println!("critical path ({}):", report.critical_path.len());
        for id in &report.critical_path {
            println!("  - {}", label(id));
        }
    }

    if report.has_advisories() {
        println!();
        println!("advisories ({}):", report.advisories.len());
        for advisory in &report.advisories {
            println!("  - {advisory}");
        }
    }
}

/// Simple dry-run output: print the WBS tree and relations.
fn print_dry_run(file: &ProjectFile) {
    println!("wbsched dry-run");
    println!(
        "  project = {} ({})",
        file.project.display_name(),
        file.project.id
    );
    println!(
        "  config.default_resource_unit = {}",
        file.config.default_resource_unit
    );
    println!("  config.reject_slips = {}", file.config.reject_slips);
    println!();

    println!("tasks ({}):", file.tasks.len());
    for task in &file.tasks {
        let indent = "  ".repeat(task.wbs.level() as usize + 1);
        let kind = if task.milestone { " [milestone]" } else { "" };
        println!(
            "{indent}{} {}{kind}: {} .. {}",
            task.wbs, task.title, task.start, task.end
        );
    }

    if !file.relations.is_empty() {
        println!();
        println!("relations ({}):", file.relations.len());
        for rel in &file.relations {
            println!(
                "  - {} -> {} {} lag {}",
                rel.predecessor, rel.successor, rel.relation_type, rel.lag
            );
        }
    }

    debug!("dry-run complete (nothing recomputed)");
}
