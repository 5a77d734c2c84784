use wbsched::errors::{ProjectError, StructuralError, TaskError};
use wbsched::types::AmountField;
use wbsched_test_utils::fixtures::ProjectFixture;
use wbsched_test_utils::init_tracing;

#[test]
fn work_package_costs_roll_up_to_every_ancestor() {
    init_tracing();
    let mut fx = ProjectFixture::new("rollup");
    let level3 = fx.with_chain_to_level3();
    let a = fx.costed("1.1.1.1.1", 9600.0, 0.0, 0.0);
    let b = fx.costed("1.1.1.1.2", 5000.0, 2000.0, 200.0);

    let report = fx.project.recompute().unwrap();
    assert_eq!(report.rollups_updated, 6);

    let root = fx.project.task_by_wbs(&wbsched_test_utils::wbs("1")).unwrap();
    let level1 = fx.project.task_by_wbs(&wbsched_test_utils::wbs("1.1")).unwrap();
    assert_eq!(root.budget_rollup(), 16800.0);
    assert_eq!(level1.budget_rollup(), 16800.0);
    assert_eq!(fx.project.task(level3).unwrap().budget_rollup(), 16800.0);
    assert_eq!(fx.project.task(a).unwrap().budget_rollup(), 9600.0);
    assert_eq!(fx.project.task(b).unwrap().budget_rollup(), 7200.0);
}

#[test]
fn costs_above_work_package_level_are_rejected() {
    let mut fx = ProjectFixture::new("rollup");
    fx.with_chain_to_level3();
    let level3 = fx.project.task_by_wbs(&wbsched_test_utils::wbs("1.1.1.1")).unwrap().id;
    fx.costed("1.1.1.1.1", 100.0, 0.0, 0.0);
    fx.project.recompute().unwrap();

    let err = fx
        .project
        .update_cost_fields(level3, 1_000_000.0, 0.0, 0.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Task(TaskError::Structural(StructuralError::CostBelowWorkPackage {
            level: 3,
            ..
        }))
    ));

    let summary = fx.project.summary();
    let report = fx.project.recompute().unwrap();
    assert_eq!(report.rollups_updated, 0);
    let task = fx.project.task(level3).unwrap();
    assert_eq!(task.total_cost(), 0.0);
    assert_eq!(task.budget_rollup(), 100.0);
    assert_eq!(summary.total_budget_from_level4_plus, task.budget_rollup());
}

#[test]
fn cost_update_marks_ancestors_and_recompute_is_idempotent() {
    let mut fx = ProjectFixture::new("rollup");
    fx.with_chain_to_level3();
    let a = fx.costed("1.1.1.1.1", 10.0, 0.0, 0.0);
    fx.costed("1.1.1.1.2", 20.0, 0.0, 0.0);
    fx.project.recompute().unwrap();

    let second = fx.project.recompute().unwrap();
    assert_eq!(second.rollups_updated, 0);

    let updated = fx.project.update_cost_fields(a, 1.0, 2.0, 3.0).unwrap();
    assert_eq!(updated.total_cost(), 6.0);
    for t in fx.project.tasks().ancestors(a).unwrap() {
        assert!(fx.project.tasks().is_dirty(t.id), "{} should be dirty", t.wbs_code);
    }

    fx.project.recompute().unwrap();
    let root = fx.project.task_by_wbs(&wbsched_test_utils::wbs("1")).unwrap().id;
    assert_eq!(fx.project.task(root).unwrap().budget_rollup(), 26.0);
    assert_eq!(fx.project.tasks().dirty_tasks().count(), 0);

    fx.project.recompute_full().unwrap();
    assert_eq!(fx.project.task(root).unwrap().budget_rollup(), 26.0);
}

#[test]
fn negative_cost_update_is_rejected_and_state_unchanged() {
    let mut fx = ProjectFixture::new("rollup");
    fx.with_chain_to_level3();
    let a = fx.costed("1.1.1.1.1", 10.0, 5.0, 0.0);
    fx.project.recompute().unwrap();

    let err = fx.project.update_cost_fields(a, 10.0, -5.0, 0.0).unwrap_err();
    match err {
        ProjectError::Task(TaskError::NegativeAmount { field, value }) => {
            assert_eq!(field, AmountField::CostMaterial);
            assert_eq!(value, -5.0);
        }
        e => panic!("Expected NegativeAmount, got: {:?}", e),
    }

    let task = fx.project.task(a).unwrap();
    assert_eq!(task.costs.material(), 5.0);
    assert_eq!(task.total_cost(), 15.0);
    assert!(!fx.project.tasks().is_dirty(a));
}

#[test]
fn deleting_a_work_package_shrinks_ancestor_budgets() {
    let mut fx = ProjectFixture::new("rollup");
    fx.with_chain_to_level3();
    fx.costed("1.1.1.1.1", 9600.0, 0.0, 0.0);
    let b = fx.costed("1.1.1.1.2", 7200.0, 0.0, 0.0);
    fx.project.recompute().unwrap();

    fx.project.delete_task(b).unwrap();
    fx.project.recompute().unwrap();

    let root = fx.project.task_by_wbs(&wbsched_test_utils::wbs("1")).unwrap();
    assert_eq!(root.budget_rollup(), 9600.0);
}

#[test]
fn summary_counts_work_packages_from_authored_costs() {
    let mut fx = ProjectFixture::new("rollup");
    fx.with_chain_to_level3();
    fx.costed("1.1.1.1.1", 9600.0, 0.0, 0.0);
    fx.costed("1.1.1.1.2", 7000.0, 200.0, 0.0);

    let summary = fx.project.summary();
    assert_eq!(summary.total_tasks, 6);
    assert_eq!(summary.level4_plus_count, 2);
    assert_eq!(summary.total_budget_from_level4_plus, 16800.0);
}
