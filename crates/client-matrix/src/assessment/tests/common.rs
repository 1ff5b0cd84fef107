use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::access::{Actor, OrganizationId, Role, UserId};
use crate::assessment::AssessmentFlow;
use crate::clients::{ClientService, NewClient};
use crate::http::{ORGANIZATION_HEADER, ROLE_HEADER, USER_HEADER};
use crate::matrices::{CriterionDraft, MatrixDetail, MatrixDraft, MatrixService, StatusDraft};
use crate::scoring::CriterionId;
use crate::storage::SqliteStore;

pub(super) type Flow = AssessmentFlow<SqliteStore, SqliteStore, SqliteStore>;

pub(super) struct Fixture {
    pub(super) flow: Arc<Flow>,
    pub(super) matrices: Arc<MatrixService<SqliteStore>>,
    pub(super) clients: Arc<ClientService<SqliteStore, SqliteStore>>,
    pub(super) matrix: MatrixDetail,
}

impl Fixture {
    pub(super) fn criterion(&self, name: &str) -> CriterionId {
        self.matrix
            .criterion_named(name)
            .map(|criterion| criterion.id)
            .expect("criterion in fixture matrix")
    }
}

pub(super) fn member() -> Actor {
    Actor {
        organization_id: OrganizationId(1),
        user_id: UserId(10),
        role: Role::Member,
    }
}

pub(super) fn outsider() -> Actor {
    Actor {
        organization_id: OrganizationId(999),
        user_id: UserId(66),
        role: Role::Owner,
    }
}

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn prospect(name: &str) -> NewClient {
    NewClient {
        company_name: name.to_string(),
        contact_person: "Dana".to_string(),
        ..NewClient::default()
    }
}

fn status(label: &str, weight: f64, sort_order: i32) -> StatusDraft {
    StatusDraft {
        label: label.to_string(),
        weight,
        sort_order,
    }
}

fn criterion(axis: &str, name: &str, statuses: Vec<StatusDraft>) -> CriterionDraft {
    CriterionDraft {
        id: None,
        axis: axis.to_string(),
        name: name.to_string(),
        description: format!("How is {name}?"),
        weight: 1.0,
        min_value: 0.0,
        max_value: 10.0,
        sort_order: 0,
        statuses,
    }
}

/// Budget (x) and Relationship (y) carry statuses; Reach (x) has none and is never asked.
pub(super) fn fixture() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let matrices = Arc::new(MatrixService::new(store.clone()));
    let clients = Arc::new(ClientService::new(store.clone(), store.clone()));
    let flow = Arc::new(AssessmentFlow::new(
        store,
        matrices.clone(),
        clients.clone(),
    ));

    let matrix = matrices
        .create(
            &owner(),
            MatrixDraft {
                name: "Chat intake".to_string(),
                description: String::new(),
                criteria: vec![
                    criterion("y", "Relationship", vec![status("Cold", 1.0, 1), status("Warm", 6.0, 2)]),
                    criterion("x", "Budget", vec![status("Low", 2.0, 1), status("High", 8.0, 2)]),
                    criterion("x", "Reach", Vec::new()),
                ],
            },
        )
        .expect("matrix created");

    Fixture {
        flow,
        matrices,
        clients,
        matrix,
    }
}

pub(super) fn owner() -> Actor {
    Actor {
        role: Role::Owner,
        ..member()
    }
}

pub(super) fn json_request(uri: &str, actor: Option<&Actor>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(actor) = actor {
        builder = builder
            .header(ORGANIZATION_HEADER, actor.organization_id.0.to_string())
            .header(USER_HEADER, actor.user_id.0.to_string())
            .header(ROLE_HEADER, actor.role.label());
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
