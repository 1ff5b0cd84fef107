use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::access::{Actor, OrganizationId, Role, UserId};
use crate::clients::{
    Client, ClientDetail, ClientFilter, ClientId, ClientRepository, ClientService, ClientUpdate,
    NewClient, ScoreEvaluator, ScoreInput,
};
use crate::http::{ORGANIZATION_HEADER, ROLE_HEADER, USER_HEADER};
use crate::matrices::{CriterionDraft, MatrixDetail, MatrixDraft, MatrixService};
use crate::repository::RepositoryError;
use crate::scoring::{CriterionId, ScoreOutcome};
use crate::storage::SqliteStore;

pub(super) type Clients = ClientService<SqliteStore, SqliteStore>;

pub(super) struct Fixture {
    pub(super) clients: Arc<Clients>,
    pub(super) matrices: Arc<MatrixService<SqliteStore>>,
    pub(super) matrix: MatrixDetail,
}

impl Fixture {
    pub(super) fn criterion(&self, name: &str) -> CriterionId {
        self.matrix
            .criterion_named(name)
            .map(|criterion| criterion.id)
            .expect("criterion in fixture matrix")
    }

    /// Budget 8 and Reach 4 on x, Relationship 3 on y: (6.0, 3.0) in either mode.
    pub(super) fn growth_scores(&self) -> Vec<ScoreInput> {
        vec![
            score(self.criterion("Budget"), 8.0),
            score(self.criterion("Reach"), 4.0),
            score(self.criterion("Relationship"), 3.0),
        ]
    }

    pub(super) fn linked(&self, company_name: &str) -> NewClient {
        NewClient {
            company_name: company_name.to_string(),
            matrix_id: Some(self.matrix.matrix.id),
            ..NewClient::default()
        }
    }
}

pub(super) fn owner() -> Actor {
    Actor {
        organization_id: OrganizationId(1),
        user_id: UserId(10),
        role: Role::Owner,
    }
}

pub(super) fn member() -> Actor {
    Actor {
        role: Role::Member,
        ..owner()
    }
}

pub(super) fn outsider() -> Actor {
    Actor {
        organization_id: OrganizationId(2),
        user_id: UserId(20),
        role: Role::Owner,
    }
}

pub(super) fn score(criterion_id: CriterionId, value: f64) -> ScoreInput {
    ScoreInput {
        criterion_id,
        score: value,
        comment: String::new(),
    }
}

fn criterion(axis: &str, name: &str) -> CriterionDraft {
    CriterionDraft {
        id: None,
        axis: axis.to_string(),
        name: name.to_string(),
        description: String::new(),
        weight: 1.0,
        min_value: 0.0,
        max_value: 10.0,
        sort_order: 0,
        statuses: Vec::new(),
    }
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let matrices = Arc::new(MatrixService::new(store.clone()));
    let clients = Arc::new(ClientService::new(store.clone(), store));
    let matrix = matrices
        .create(
            &owner(),
            MatrixDraft {
                name: "Pipeline".to_string(),
                description: String::new(),
                criteria: vec![
                    criterion("x", "Budget"),
                    criterion("x", "Reach"),
                    criterion("y", "Relationship"),
                ],
            },
        )
        .expect("matrix created");

    Fixture {
        clients,
        matrices,
        matrix,
    }
}

pub(super) fn json_request(method: &str, uri: &str, actor: &Actor, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ORGANIZATION_HEADER, actor.organization_id.0.to_string())
        .header(USER_HEADER, actor.user_id.0.to_string())
        .header(ROLE_HEADER, actor.role.label())
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

pub(super) fn get_request(uri: &str, actor: &Actor) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(ORGANIZATION_HEADER, actor.organization_id.0.to_string())
        .header(USER_HEADER, actor.user_id.0.to_string())
        .header(ROLE_HEADER, actor.role.label())
        .body(Body::empty())
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableClients;

impl UnavailableClients {
    fn down<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ClientRepository for UnavailableClients {
    fn insert_client(
        &self,
        _organization_id: OrganizationId,
        _created_by: UserId,
        _client: &NewClient,
    ) -> Result<ClientId, RepositoryError> {
        Self::down()
    }

    fn fetch_client(&self, _id: ClientId) -> Result<Option<ClientDetail>, RepositoryError> {
        Self::down()
    }

    fn list_clients(
        &self,
        _organization_id: OrganizationId,
        _filter: &ClientFilter,
    ) -> Result<Vec<Client>, RepositoryError> {
        Self::down()
    }

    fn update_profile(&self, _id: ClientId, _update: &ClientUpdate) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn deactivate_client(&self, _id: ClientId) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn active_company_exists(
        &self,
        _organization_id: OrganizationId,
        _company_name: &str,
    ) -> Result<bool, RepositoryError> {
        Self::down()
    }

    fn record_scores(
        &self,
        _id: ClientId,
        _scores: &[ScoreInput],
        _evaluate: ScoreEvaluator<'_>,
    ) -> Result<Option<ScoreOutcome>, RepositoryError> {
        Self::down()
    }
}
