use super::common::*;
use std::sync::Arc;

use chrono::Duration;

use crate::access::{Role, UserId};
use crate::clients::{ClientRepository, NewClient};
use crate::matrices::{
    AxisNames, MatrixDraft, MatrixEdit, MatrixService, MatrixServiceError, DEFAULT_AXIS_X_NAME,
};
use crate::repository::RepositoryError;
use crate::scoring::{Axis, QuadrantPolicy, QuadrantRule, RuleOperator};

fn rule(quadrant: &str, x_min: f64, priority: i32) -> QuadrantRule {
    QuadrantRule {
        quadrant: quadrant.to_string(),
        x_min,
        y_min: 0.0,
        x_operator: RuleOperator::And,
        priority,
    }
}

#[test]
fn create_requires_name_and_criteria() {
    let (service, _) = build_service();

    let unnamed = MatrixDraft {
        name: "   ".to_string(),
        ..pipeline_draft()
    };
    assert!(matches!(
        service.create(&owner(), unnamed),
        Err(MatrixServiceError::Validation(_))
    ));

    let empty = MatrixDraft {
        criteria: Vec::new(),
        ..pipeline_draft()
    };
    assert!(matches!(
        service.create(&owner(), empty),
        Err(MatrixServiceError::Validation(_))
    ));
}

#[test]
fn members_cannot_create_matrices() {
    let (service, _) = build_service();
    let error = service
        .create(&actor(Role::Member), pipeline_draft())
        .expect_err("member rejected");
    assert!(matches!(error, MatrixServiceError::Forbidden(_)));
}

#[test]
fn created_matrix_starts_with_fixed_threshold_policy() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);

    assert_eq!(detail.matrix.name, "Pipeline");
    assert_eq!(detail.matrix.organization_id, ORG);
    assert!(detail.matrix.is_active);
    assert_eq!(detail.criteria.len(), 2);
    assert_eq!(detail.policy(), QuadrantPolicy::default());

    let relationship = detail.criterion_named("Relationship").expect("criterion");
    assert_eq!(relationship.axis, Axis::Y);
    assert_eq!(relationship.statuses.len(), 2);
}

#[test]
fn template_matrix_copies_catalog_criteria() {
    let (service, _) = build_service();
    let template = service
        .templates()
        .find("strategic_fit")
        .expect("template present");
    let expected = template.criteria.len();

    let detail = service
        .create_from_template(&actor(Role::Manager), "strategic_fit", "Q3 accounts", "")
        .expect("created");
    assert_eq!(detail.criteria.len(), expected);
    assert_eq!(detail.matrix.template_key.as_deref(), Some("strategic_fit"));

    let unknown = service.create_from_template(&owner(), "nope", "Name", "");
    assert!(matches!(unknown, Err(MatrixServiceError::Validation(_))));
}

#[test]
fn custom_matrix_is_seeded_with_one_universal_criterion() {
    let (service, _) = build_service();
    let detail = service
        .create_custom(&owner(), "Scratch", "")
        .expect("created");

    assert_eq!(detail.criteria.len(), 1);
    assert_eq!(detail.criteria[0].axis, Axis::Universal);
}

#[test]
fn edit_merges_criteria_by_id_and_keeps_the_rest() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);
    let budget = detail.criterion_named("Budget").expect("budget").clone();

    let mut updated = criterion_draft("x", "Budget (annual)", 3.0);
    updated.id = Some(budget.id);
    let edit = MatrixEdit {
        name: Some(" Pipeline 2024 ".to_string()),
        criteria: vec![updated, criterion_draft("y", "Urgency", 1.0)],
        ..MatrixEdit::default()
    };

    let edited = service
        .apply_matrix_edit(&owner(), detail.matrix.id, edit)
        .expect("edited");
    assert_eq!(edited.matrix.name, "Pipeline 2024");
    assert_eq!(edited.criteria.len(), 3);

    let renamed = edited.criterion(budget.id).expect("same id survives");
    assert_eq!(renamed.name, "Budget (annual)");
    assert_eq!(renamed.weight, 3.0);
    assert!(edited.criterion_named("Relationship").is_some());
}

#[test]
fn edit_ignores_criteria_owned_by_another_matrix() {
    let (service, _) = build_service();
    let first = seeded_matrix(&service);
    let second = seeded_matrix(&service);
    let foreign = second.criterion_named("Budget").expect("budget").clone();

    let mut hijack = criterion_draft("x", "Hijacked", 9.0);
    hijack.id = Some(foreign.id);
    service
        .apply_matrix_edit(
            &owner(),
            first.matrix.id,
            MatrixEdit {
                criteria: vec![hijack],
                ..MatrixEdit::default()
            },
        )
        .expect("edit accepted");

    let untouched = service.get(&owner(), second.matrix.id).expect("reload");
    assert_eq!(
        untouched.criterion(foreign.id).expect("criterion").name,
        "Budget"
    );
}

#[test]
fn quadrant_rules_replace_the_whole_set() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);
    let id = detail.matrix.id;

    service
        .replace_quadrant_rules(&owner(), id, vec![rule("a", 1.0, 1), rule("b", 0.0, 2)])
        .expect("rules stored");
    let replaced = service
        .replace_quadrant_rules(&owner(), id, vec![rule(" vip ", 8.0, 1)])
        .expect("rules replaced");

    assert_eq!(replaced.quadrant_rules.len(), 1);
    assert_eq!(replaced.quadrant_rules[0].quadrant, "vip");
    assert!(matches!(replaced.policy(), QuadrantPolicy::RuleList { .. }));

    let empty = service.replace_quadrant_rules(&owner(), id, Vec::new());
    assert!(matches!(empty, Err(MatrixServiceError::Validation(_))));
}

#[test]
fn blank_axis_names_fall_back_to_defaults() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);

    let updated = service
        .update_axis_names(
            &owner(),
            detail.matrix.id,
            AxisNames {
                axis_x_name: "  ".to_string(),
                axis_y_name: "Readiness".to_string(),
            },
        )
        .expect("updated");
    assert_eq!(updated.matrix.axis_x_label(), DEFAULT_AXIS_X_NAME);
    assert_eq!(updated.matrix.axis_y_label(), "Readiness");
}

#[test]
fn other_organizations_see_not_found_and_cannot_mutate() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);
    let id = detail.matrix.id;

    assert!(matches!(
        service.get(&outsider(), id),
        Err(MatrixServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.soft_delete(&outsider(), id, at(1, 0)),
        Err(MatrixServiceError::Forbidden(_))
    ));
    assert!(service.list(&outsider()).expect("list").is_empty());
}

#[test]
fn managers_cannot_delete() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);

    let error = service
        .soft_delete(&actor(Role::Manager), detail.matrix.id, at(1, 0))
        .expect_err("manager rejected");
    assert!(matches!(error, MatrixServiceError::Forbidden(_)));
}

#[test]
fn permanent_delete_requires_soft_delete_first() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);

    let error = service
        .delete_permanently(&owner(), detail.matrix.id)
        .expect_err("live matrix");
    assert!(matches!(error, MatrixServiceError::NotSoftDeleted(_)));
}

#[test]
fn soft_delete_keeps_first_timestamp() {
    let (service, _) = build_service();
    let id = seeded_matrix(&service).matrix.id;

    let first = service.soft_delete(&owner(), id, at(1, 0)).expect("deleted");
    let second = service.soft_delete(&owner(), id, at(2, 0)).expect("deleted again");

    assert_eq!(first.deleted_at, Some(at(1, 0)));
    assert_eq!(second.deleted_at, Some(at(1, 0)));
    assert!(!second.is_active);
}

#[test]
fn removing_a_criterion_hides_it_from_the_matrix() {
    let (service, _) = build_service();
    let detail = seeded_matrix(&service);
    let id = detail.matrix.id;
    let budget = detail
        .criterion_named("Budget")
        .map(|criterion| criterion.id)
        .expect("budget");

    assert!(matches!(
        service.remove_criterion(&actor(Role::Member), id, budget),
        Err(MatrixServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.remove_criterion(&outsider(), id, budget),
        Err(MatrixServiceError::Forbidden(_))
    ));

    let updated = service
        .remove_criterion(&actor(Role::Manager), id, budget)
        .expect("removed");
    assert!(updated.criterion(budget).is_none());
    assert_eq!(updated.criteria.len(), 1);
    let summary = service.list(&owner()).expect("list");
    assert_eq!(summary[0].criteria_count, 1);

    assert!(matches!(
        service.remove_criterion(&owner(), id, budget),
        Err(MatrixServiceError::CriterionNotFound { .. })
    ));
}

#[test]
fn permanent_delete_cascades_and_unlinks_clients() {
    let (service, store) = build_service();
    let id = seeded_matrix(&service).matrix.id;
    store
        .insert_client(
            ORG,
            UserId(10),
            &NewClient {
                company_name: "Acme".to_string(),
                matrix_id: Some(id),
                ..NewClient::default()
            },
        )
        .expect("client");

    service.soft_delete(&owner(), id, at(1, 0)).expect("soft");
    let stats = service.delete_stats(&owner(), id).expect("stats");
    assert_eq!(stats.matrix_name, "Pipeline");
    assert_eq!(stats.criteria_count, 2);
    assert_eq!(stats.statuses_count, 2);
    assert_eq!(stats.clients_count, 1);

    let counts = service.delete_permanently(&owner(), id).expect("purged");
    assert_eq!(counts.deleted_criteria, 2);
    assert_eq!(counts.deleted_statuses, 2);
    assert_eq!(counts.unlinked_clients, 1);

    assert!(matches!(
        service.get(&owner(), id),
        Err(MatrixServiceError::NotFound(_))
    ));
}

#[test]
fn sweep_purges_only_matrices_past_retention() {
    let (service, _) = build_service();
    let expired = seeded_matrix(&service).matrix.id;
    let boundary = seeded_matrix(&service).matrix.id;
    let live = seeded_matrix(&service).matrix.id;

    service.soft_delete(&owner(), expired, at(1, 0)).expect("soft");
    service.soft_delete(&owner(), boundary, at(2, 0)).expect("soft");

    let report = service
        .purge_expired_matrices(at(5, 0), Duration::days(3))
        .expect("sweep");
    assert_eq!(report.matrices_purged, 1);
    assert_eq!(report.counts.deleted_criteria, 2);

    assert!(service.get(&owner(), expired).is_err());
    assert!(service.get(&owner(), boundary).is_ok());
    assert!(service.get(&owner(), live).is_ok());

    let again = service
        .purge_expired_matrices(at(5, 0), Duration::days(3))
        .expect("second sweep");
    assert_eq!(again.matrices_purged, 0);
}

#[test]
fn repository_failures_surface_as_repository_errors() {
    let service = MatrixService::new(Arc::new(UnavailableRepository));
    let error = service.list(&owner()).expect_err("offline");
    assert!(matches!(
        error,
        MatrixServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}
