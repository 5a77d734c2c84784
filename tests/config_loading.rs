use std::io::Write;

use tempfile::NamedTempFile;
use wbsched::cli::CliArgs;
use wbsched::config::load_and_validate;
use wbsched::errors::{ProjectError, StructuralError, TaskError, WbsError};
use wbsched::ids::ActivityIdAllocator;
use wbsched::persist::{FileRepository, ProjectRepository};
use wbsched::types::RelationType;
use wbsched_test_utils::builders::{ProjectFileBuilder, SeedTaskBuilder};

const BRIDGE: &str = r#"
[project]
id = "bridge"
name = "Bridge refurbishment"

[config]
default_resource_unit = "shift"

[[task]]
wbs = "1"
title = "Bridge"
start = "2024-01-01"
end = "2024-06-30"

[[task]]
wbs = "1.1"
title = "Deck"
start = "2024-01-01"
end = "2024-02-29"

[[task]]
wbs = "1.2"
title = "Paint"
start = "2024-03-01"
end = "2024-03-31"

[[relation]]
predecessor = "1.1"
successor = "1.2"
"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_and_applies_defaults() {
    let file = write_temp(BRIDGE);
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.project.display_name(), "Bridge refurbishment");
    assert_eq!(cfg.config.default_resource_unit, "shift");
    assert!(!cfg.config.reject_slips);
    assert_eq!(cfg.tasks.len(), 3);
    assert_eq!(cfg.relations[0].relation_type, RelationType::FinishToStart);
    assert_eq!(cfg.relations[0].lag, 0);
}

#[test]
fn relation_cycle_returns_config_error() {
    let file = write_temp(&format!(
        "{BRIDGE}\n[[relation]]\npredecessor = \"1.2\"\nsuccessor = \"1.1\"\ntype = \"SS\"\n"
    ));

    match load_and_validate(file.path()) {
        Err(WbsError::ConfigError(msg)) => {
            assert!(msg.contains("cycle detected"), "{msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_relation_task_returns_config_error() {
    let file = write_temp(&format!(
        "{BRIDGE}\n[[relation]]\npredecessor = \"1.1\"\nsuccessor = \"9.9\"\n"
    ));

    match load_and_validate(file.path()) {
        Err(WbsError::ConfigError(msg)) => assert!(msg.contains("unknown task '9.9'"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_parent_returns_config_error() {
    let raw = ProjectFileBuilder::new("p")
        .with_task(SeedTaskBuilder::new("1", "2024-01-01", "2024-01-31").build())
        .with_task(SeedTaskBuilder::new("1.2.1", "2024-01-01", "2024-01-31").build())
        .raw();

    match wbsched::config::ProjectFile::try_from(raw) {
        Err(WbsError::ConfigError(msg)) => assert!(msg.contains("no parent task '1.2'"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn seeded_cost_on_summary_task_is_rejected() {
    let file = ProjectFileBuilder::new("p")
        .with_task(SeedTaskBuilder::new("1", "2024-01-01", "2024-01-31").build())
        .with_task(
            SeedTaskBuilder::new("1.1", "2024-01-01", "2024-01-31")
                .costs(500.0, 0.0, 0.0)
                .build(),
        )
        .build();

    let err = wbsched::config::build_project(&file, &mut ActivityIdAllocator::new())
        .map(|_| ())
        .unwrap_err();
    assert!(
        matches!(
            err,
            WbsError::Project(ProjectError::Task(TaskError::Structural(
                StructuralError::CostBelowWorkPackage { .. }
            )))
        ),
        "{err}"
    );
}

#[test]
fn malformed_wbs_code_is_a_toml_error() {
    let file = write_temp(
        r#"
[project]
id = "p"

[[task]]
wbs = "1..2"
title = "x"
start = "2024-01-01"
end = "2024-01-02"
"#,
    );

    match load_and_validate(file.path()) {
        Err(WbsError::TomlError(e)) => assert!(e.to_string().contains("1..2"), "{e}"),
        other => panic!("Expected TomlError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let res = load_and_validate("/definitely/not/here/Project.toml");
    assert!(matches!(res, Err(WbsError::IoError(_))));
}

#[tokio::test]
async fn run_writes_recomputed_project_to_output_dir() {
    wbsched_test_utils::init_tracing();
    let file = write_temp(BRIDGE);
    let out = tempfile::tempdir().unwrap();

    let args = CliArgs {
        project: file.path().to_path_buf(),
        output: Some(out.path().to_path_buf()),
        log_level: None,
        dry_run: false,
    };
    wbsched::run(args).await.unwrap();

    let repo = FileRepository::new(out.path());
    let record = repo.load("bridge").unwrap().expect("project saved");
    assert_eq!(record.tasks.len(), 3);
    assert!(record.tasks.iter().all(|t| t.schedule.is_some() || t.wbs_code.to_string() == "1"));
}

#[tokio::test]
async fn run_fails_on_slips_when_rejected() {
    let file = write_temp(&BRIDGE.replace(
        "[config]\n",
        "[config]\nreject_slips = true\n",
    ).replace("end = \"2024-02-29\"", "end = \"2024-03-05\""));

    let args = CliArgs {
        project: file.path().to_path_buf(),
        output: None,
        log_level: None,
        dry_run: false,
    };
    let err = wbsched::run(args).await.unwrap_err();
    assert!(err.to_string().contains("reject_slips"), "{err}");
}

#[tokio::test]
async fn dry_run_does_not_write() {
    let file = write_temp(BRIDGE);
    let out = tempfile::tempdir().unwrap();

    let args = CliArgs {
        project: file.path().to_path_buf(),
        output: Some(out.path().to_path_buf()),
        log_level: None,
        dry_run: true,
    };
    wbsched::run(args).await.unwrap();

    assert!(FileRepository::new(out.path()).list().unwrap().is_empty());
}
