use std::collections::BTreeSet;
use std::sync::Arc;

use wbsched::engine::ProjectService;
use wbsched::errors::{ProjectError, RelationError, StructuralError, TaskError};
use wbsched::model::NewTask;
use wbsched::persist::{FileRepository, ProjectRepository};
use wbsched::types::{RelationType, TaskId};
use wbsched_test_utils::builders::{ProjectFileBuilder, SeedTaskBuilder};
use wbsched_test_utils::{date, init_tracing, wbs, with_timeout};

async fn add(service: &ProjectService, project: &str, code: &str, start: &str, end: &str) -> TaskId {
    let code = wbs(code);
    let parent = code.parent();
    service
        .create_task(
            project,
            parent.as_ref(),
            NewTask::new(code, "task", date(start), date(end)),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn create_recompute_and_summarise() {
    init_tracing();
    let service = ProjectService::in_memory();
    service.create_project("p1", "Pilot").await.unwrap();

    add(&service, "p1", "1", "2024-01-01", "2024-12-31").await;
    let a = add(&service, "p1", "1.1", "2024-01-01", "2024-02-29").await;
    let b = add(&service, "p1", "1.2", "2024-03-01", "2024-03-31").await;
    service
        .create_relation("p1", a, b, RelationType::FinishToStart, 0)
        .await
        .unwrap();
    assert!(matches!(
        service.update_cost_fields("p1", a, 100.0, 0.0, 0.0).await,
        Err(ProjectError::Task(TaskError::Structural(
            StructuralError::CostBelowWorkPackage { level: 1, .. }
        )))
    ));

    let report = service.recompute_project("p1").await.unwrap();
    assert!(report.advisories.is_empty());
    // FS measures from the predecessor's end date itself, so back-to-back
    // days leave one day of float.
    assert_eq!(report.critical_path, vec![b]);
    let a_sched = *service.get_task("p1", a).await.unwrap().schedule().unwrap();
    assert_eq!(a_sched.total_float_days, 1);

    let summary = service.get_project_summary("p1").await.unwrap();
    assert_eq!(summary.total_tasks, 3);
    assert_eq!(summary.level4_plus_count, 0);
    assert_eq!(summary.total_budget_from_level4_plus, 0.0);

    let subtree = service.subtree("p1", TaskId(1)).await.unwrap();
    let codes: Vec<String> = subtree.iter().map(|t| t.wbs_code.to_string()).collect();
    assert_eq!(codes, vec!["1", "1.1", "1.2"]);
}

#[tokio::test]
async fn unknown_and_duplicate_projects() {
    let service = ProjectService::in_memory();
    service.create_project("p1", "Pilot").await.unwrap();

    assert!(matches!(
        service.create_project("p1", "Again").await,
        Err(ProjectError::ProjectExists(id)) if id == "p1"
    ));
    assert!(matches!(
        service.recompute_project("nope").await,
        Err(ProjectError::ProjectNotFound(id)) if id == "nope"
    ));
    assert!(matches!(
        service.get_task("p1", TaskId(1)).await,
        Err(ProjectError::Task(TaskError::NotFound(_)))
    ));
}

#[tokio::test]
async fn cycle_is_rejected_through_the_service() {
    let service = ProjectService::in_memory();
    service.create_project("p1", "Pilot").await.unwrap();
    add(&service, "p1", "1", "2024-01-01", "2024-12-31").await;
    let a = add(&service, "p1", "1.1", "2024-01-01", "2024-01-10").await;
    let b = add(&service, "p1", "1.2", "2024-01-11", "2024-01-20").await;
    service
        .create_relation("p1", a, b, RelationType::FinishToStart, 0)
        .await
        .unwrap();

    let res = service
        .create_relation("p1", b, a, RelationType::FinishToStart, 0)
        .await;
    assert!(matches!(
        res,
        Err(ProjectError::Relation(RelationError::CycleDetected { .. }))
    ));
    assert_eq!(service.snapshot("p1").await.unwrap().relations.len(), 1);
}

#[tokio::test]
async fn concurrent_task_creation_yields_unique_activity_ids() {
    let service = Arc::new(ProjectService::in_memory());
    for p in ["p1", "p2", "p3"] {
        service.create_project(p, p).await.unwrap();
        add(&service, p, "1", "2024-01-01", "2024-12-31").await;
    }

    let mut handles = Vec::new();
    for p in ["p1", "p2", "p3"] {
        for i in 1..=10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let code = wbs(&format!("1.{i}"));
                service
                    .create_task(
                        p,
                        Some(&wbs("1")),
                        NewTask::new(code, "t", date("2024-01-01"), date("2024-01-02")),
                    )
                    .await
                    .unwrap()
                    .activity_id
            }));
        }
    }

    let mut seen = BTreeSet::new();
    for h in handles {
        let id = with_timeout(h).await.unwrap();
        assert!(seen.insert(id.clone()), "duplicate activity id {id}");
    }
    assert_eq!(seen.len(), 30);
}

#[tokio::test]
async fn readers_see_committed_state_only() {
    let service = Arc::new(ProjectService::in_memory());
    service.create_project("p1", "Pilot").await.unwrap();
    add(&service, "p1", "1", "2024-01-01", "2024-12-31").await;
    let a = add(&service, "p1", "1.1", "2024-01-01", "2024-01-10").await;
    let b = add(&service, "p1", "1.2", "2024-01-05", "2024-01-08").await;
    service
        .create_relation("p1", a, b, RelationType::FinishToStart, 0)
        .await
        .unwrap();

    let writer = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.recompute_project("p1").await.unwrap() })
    };
    let reader = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.get_task("p1", b).await.unwrap() })
    };

    let task = with_timeout(reader).await.unwrap();
    // Either before or after the recompute, never in between.
    match task.schedule() {
        None => {}
        Some(s) => {
            assert_eq!(s.start, date("2024-01-10"));
            assert_eq!(s.end, date("2024-01-13"));
        }
    }
    with_timeout(writer).await.unwrap();
}

#[tokio::test]
async fn save_and_load_through_file_repository() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let first = ProjectService::new(Arc::new(FileRepository::new(dir.path())));
    let file = ProjectFileBuilder::new("bridge")
        .name("Bridge")
        .with_task(SeedTaskBuilder::new("1", "2024-01-01", "2024-06-30").build())
        .with_task(SeedTaskBuilder::new("1.1", "2024-01-01", "2024-01-31").build())
        .with_task(SeedTaskBuilder::new("1.2", "2024-02-01", "2024-02-28").build())
        .relation("1.1", "1.2", RelationType::FinishToStart, 1)
        .build();
    let id = first.seed(&file).await.unwrap();
    first.recompute_project(&id).await.unwrap();
    first.save_project(&id).await.unwrap();

    let repo = FileRepository::new(dir.path());
    assert!(repo.path_for("bridge").exists());
    assert_eq!(repo.list().unwrap(), vec!["bridge".to_string()]);

    let second = ProjectService::new(Arc::new(repo));
    second.load_project("bridge").await.unwrap();
    assert!(matches!(
        second.load_project("bridge").await,
        Err(ProjectError::ProjectExists(_))
    ));
    assert!(matches!(
        second.load_project("missing").await,
        Err(ProjectError::ProjectNotFound(_))
    ));

    let record = second.snapshot("bridge").await.unwrap();
    assert_eq!(record.name, "Bridge");
    assert_eq!(record.tasks.len(), 3);
    assert_eq!(record.relations.len(), 1);

    // The allocator continues after the loaded activity IDs.
    let task = second
        .create_task(
            "bridge",
            Some(&wbs("1")),
            NewTask::new(wbs("1.3"), "new", date("2024-03-01"), date("2024-03-02")),
        )
        .await
        .unwrap();
    assert_eq!(task.activity_id, "A1040");

    let report = second.recompute_project("bridge").await.unwrap();
    assert_eq!(report.critical_path.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn colliding_project_ids_do_not_overwrite_each_other() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let service = ProjectService::new(Arc::new(FileRepository::new(dir.path())));

    for (id, name) in [("bridge a", "First"), ("Bridge A", "Second")] {
        let file = ProjectFileBuilder::new(id)
            .name(name)
            .with_task(SeedTaskBuilder::new("1", "2024-01-01", "2024-01-31").build())
            .build();
        service.seed(&file).await.unwrap();
    }

    with_timeout(service.save_project("bridge a")).await.unwrap();
    let err = with_timeout(service.save_project("Bridge A"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProjectError::Persistence(_)), "{err}");

    assert_eq!(
        service.stored_projects().await.unwrap(),
        vec!["bridge a".to_string()]
    );
    let reloaded = ProjectService::new(Arc::new(FileRepository::new(dir.path())));
    reloaded.load_project("bridge a").await.unwrap();
    assert_eq!(reloaded.snapshot("bridge a").await.unwrap().name, "First");
}
