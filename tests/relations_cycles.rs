use wbsched::errors::{ProjectError, RelationError, StructuralError};
use wbsched::types::{RelationType, TaskId};
use wbsched_test_utils::fixtures::ProjectFixture;

fn three_tasks() -> (ProjectFixture, TaskId, TaskId, TaskId) {
    let mut fx = ProjectFixture::new("rel");
    fx.task("1", "2024-01-01", "2024-12-31");
    let a = fx.task("1.1", "2024-01-01", "2024-01-10");
    let b = fx.task("1.2", "2024-01-11", "2024-01-20");
    let c = fx.task("1.3", "2024-01-21", "2024-01-31");
    (fx, a, b, c)
}

#[test]
fn reverse_relation_is_a_cycle_and_changes_nothing() {
    let (mut fx, a, b, _) = three_tasks();
    fx.relate(a, b, RelationType::FinishToStart, 0);

    let err = fx
        .project
        .create_relation(b, a, RelationType::FinishToStart, 0)
        .unwrap_err();
    match err {
        ProjectError::Relation(RelationError::CycleDetected {
            predecessor,
            successor,
        }) => {
            assert_eq!(predecessor, b);
            assert_eq!(successor, a);
        }
        e => panic!("Expected CycleDetected, got: {:?}", e),
    }
    assert_eq!(fx.project.relations().len(), 1);
    assert_eq!(fx.project.graph().successors_of(b).len(), 0);
}

#[test]
fn transitive_cycle_is_rejected_for_any_relation_type() {
    let (mut fx, a, b, c) = three_tasks();
    fx.relate(a, b, RelationType::StartToStart, 2);
    fx.relate(b, c, RelationType::FinishToFinish, 0);

    for ty in [
        RelationType::FinishToStart,
        RelationType::StartToStart,
        RelationType::FinishToFinish,
        RelationType::StartToFinish,
    ] {
        let res = fx.project.create_relation(c, a, ty, 0);
        assert!(
            matches!(res, Err(ProjectError::Relation(RelationError::CycleDetected { .. }))),
            "{ty} should be rejected"
        );
    }
    assert_eq!(fx.project.relations().len(), 2);

    // A parallel edge in the forward direction is fine.
    fx.relate(a, c, RelationType::FinishToStart, 0);
    assert_eq!(fx.project.relations().len(), 3);
}

#[test]
fn self_relation_is_rejected_as_cycle() {
    let (mut fx, a, _, _) = three_tasks();
    let res = fx.project.create_relation(a, a, RelationType::FinishToStart, 0);
    assert!(matches!(
        res,
        Err(ProjectError::Relation(RelationError::CycleDetected { .. }))
    ));
    assert!(fx.project.relations().is_empty());
}

#[test]
fn duplicate_triple_is_rejected_but_other_types_are_allowed() {
    let (mut fx, a, b, _) = three_tasks();
    fx.relate(a, b, RelationType::FinishToStart, 0);

    let res = fx.project.create_relation(a, b, RelationType::FinishToStart, 5);
    assert!(matches!(
        res,
        Err(ProjectError::Relation(RelationError::Structural(
            StructuralError::DuplicateRelation { .. }
        )))
    ));

    fx.relate(a, b, RelationType::StartToStart, 0);
    assert_eq!(fx.project.relations().len(), 2);
    assert_eq!(fx.project.graph().predecessors_of(b).len(), 2);
}

#[test]
fn unknown_endpoint_is_reported() {
    let (mut fx, a, _, _) = three_tasks();
    let ghost = TaskId(999);
    let res = fx.project.create_relation(a, ghost, RelationType::FinishToStart, 0);
    assert!(matches!(
        res,
        Err(ProjectError::Relation(RelationError::TaskNotFound(id))) if id == ghost
    ));
}

#[test]
fn deleting_a_relation_allows_the_reverse() {
    let (mut fx, a, b, _) = three_tasks();
    let rel = fx
        .project
        .create_relation(a, b, RelationType::FinishToStart, 0)
        .unwrap();

    fx.project.delete_relation(rel.id).unwrap();
    assert!(matches!(
        fx.project.delete_relation(rel.id),
        Err(ProjectError::Relation(RelationError::NotFound(_)))
    ));

    fx.relate(b, a, RelationType::FinishToStart, 0);
    assert_eq!(fx.project.relations().len(), 1);
}
