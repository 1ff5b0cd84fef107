use super::common::*;

use chrono::Duration;

use crate::assessment::{AssessmentError, AssessmentStep, ChatUserId};
use crate::clients::ClientFilter;
use crate::scoring::{Axis, FOCUS};

const CHAT: ChatUserId = ChatUserId(777);

#[test]
fn questions_follow_axis_order_and_skip_criteria_without_statuses() {
    let fx = fixture();
    let prompt = fx
        .flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9))
        .expect("started");

    assert_eq!(prompt.criterion_name, "Budget");
    assert_eq!(prompt.axis, Axis::X);
    assert_eq!(prompt.position, 1);
    assert_eq!(prompt.total, 2);
    let labels: Vec<_> = prompt.options.iter().map(|option| option.label.as_str()).collect();
    assert_eq!(labels, ["Low", "High"]);
}

#[test]
fn completed_assessment_saves_a_classified_client() {
    let fx = fixture();
    fx.flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9))
        .expect("started");

    let next = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Budget"), 1, at(9))
        .expect("first answer");
    let AssessmentStep::Prompt(prompt) = next else {
        panic!("expected a second question");
    };
    assert_eq!(prompt.criterion_name, "Relationship");
    assert_eq!(prompt.position, 2);

    let done = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Relationship"), 1, at(10))
        .expect("second answer");
    let AssessmentStep::Completed { client } = done else {
        panic!("expected completion");
    };

    assert_eq!(client.client.company_name, "Acme");
    assert_eq!(client.client.matrix_id, Some(fx.matrix.matrix.id));
    assert_eq!(client.client.score_x, 8.0);
    assert_eq!(client.client.score_y, 6.0);
    assert_eq!(client.client.quadrant.as_deref(), Some(FOCUS));
    let comments: Vec<_> = client.scores.iter().map(|score| score.comment.as_str()).collect();
    assert!(comments.contains(&"High"));
    assert!(comments.contains(&"Warm"));

    let again = fx.flow.choose(&member(), CHAT, fx.criterion("Relationship"), 0, at(10));
    assert!(matches!(again, Err(AssessmentError::SessionExpired(_))));
}

#[test]
fn answering_out_of_turn_is_rejected() {
    let fx = fixture();
    fx.flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9))
        .expect("started");

    let error = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Relationship"), 0, at(9))
        .expect_err("not the current question");
    assert!(matches!(error, AssessmentError::Validation(_)));

    let error = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Budget"), 5, at(9))
        .expect_err("no such status");
    assert!(matches!(error, AssessmentError::Validation(_)));
}

#[test]
fn sessions_expire_after_ttl() {
    let fx = fixture();
    fx.flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(0))
        .expect("started");

    let late = at(0) + Duration::hours(25);
    let error = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Budget"), 0, late)
        .expect_err("expired");
    assert!(matches!(error, AssessmentError::SessionExpired(_)));
    assert_eq!(fx.flow.purge_expired_sessions(late).expect("purge"), 1);
}

#[test]
fn another_organization_cannot_continue_or_cancel_a_session() {
    let fx = fixture();
    fx.flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9))
        .expect("started");

    let answer = fx
        .flow
        .choose(&outsider(), CHAT, fx.criterion("Budget"), 1, at(9));
    assert!(matches!(answer, Err(AssessmentError::SessionExpired(_))));
    let cancel = fx.flow.cancel(&outsider(), CHAT, at(9));
    assert!(matches!(cancel, Err(AssessmentError::SessionExpired(_))));

    let listed = fx
        .clients
        .list_clients(&member(), &ClientFilter::default())
        .expect("list");
    assert!(listed.is_empty());

    let next = fx
        .flow
        .choose(&member(), CHAT, fx.criterion("Budget"), 1, at(9))
        .expect("owner organization continues");
    assert!(matches!(next, AssessmentStep::Prompt(_)));
}

#[test]
fn cancel_saves_the_client_without_a_matrix() {
    let fx = fixture();
    fx.flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9))
        .expect("started");
    fx.flow
        .choose(&member(), CHAT, fx.criterion("Budget"), 1, at(9))
        .expect("answered");

    let saved = fx.flow.cancel(&member(), CHAT, at(9)).expect("cancelled");
    assert_eq!(saved.client.matrix_id, None);
    assert_eq!(saved.client.quadrant, None);
    assert!(saved.scores.is_empty());

    let listed = fx
        .clients
        .list_clients(&member(), &ClientFilter::default())
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert!(matches!(
        fx.flow.cancel(&member(), CHAT, at(9)),
        Err(AssessmentError::SessionExpired(_))
    ));
}

#[test]
fn start_requires_company_and_live_matrix() {
    let fx = fixture();
    let blank = fx
        .flow
        .start(&member(), CHAT, prospect("  "), fx.matrix.matrix.id, at(9));
    assert!(matches!(blank, Err(AssessmentError::Validation(_))));

    fx.matrices
        .soft_delete(&owner(), fx.matrix.matrix.id, at(8))
        .expect("soft deleted");
    let deleted = fx
        .flow
        .start(&member(), CHAT, prospect("Acme"), fx.matrix.matrix.id, at(9));
    assert!(matches!(deleted, Err(AssessmentError::Validation(_))));
}

#[test]
fn matrix_without_status_criteria_cannot_be_assessed() {
    let fx = fixture();
    let custom = fx
        .matrices
        .create_custom(&owner(), "Scratch", "")
        .expect("custom matrix");

    let error = fx
        .flow
        .start(&member(), CHAT, prospect("Acme"), custom.matrix.id, at(9))
        .expect_err("nothing to ask");
    assert!(matches!(error, AssessmentError::Validation(_)));
}
