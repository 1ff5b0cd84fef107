use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::access::{Actor, OrganizationId, Role, UserId};
use crate::http::{ORGANIZATION_HEADER, ROLE_HEADER, USER_HEADER};
use crate::matrices::{
    CascadeOutcome, CriterionDraft, DeleteStats, MatrixChanges, MatrixDetail, MatrixDraft,
    MatrixId, MatrixRepository, MatrixService, MatrixSummary, NewMatrix, StatusDraft,
};
use crate::repository::RepositoryError;
use crate::scoring::CriterionId;
use crate::storage::SqliteStore;

pub(super) const ORG: OrganizationId = OrganizationId(1);
pub(super) const OTHER_ORG: OrganizationId = OrganizationId(2);

pub(super) fn actor(role: Role) -> Actor {
    Actor {
        organization_id: ORG,
        user_id: UserId(10),
        role,
    }
}

pub(super) fn owner() -> Actor {
    actor(Role::Owner)
}

pub(super) fn outsider() -> Actor {
    Actor {
        organization_id: OTHER_ORG,
        user_id: UserId(20),
        role: Role::Owner,
    }
}

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn build_service() -> (Arc<MatrixService<SqliteStore>>, SqliteStore) {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    let service = Arc::new(MatrixService::new(Arc::new(store.clone())));
    (service, store)
}

pub(super) fn criterion_draft(axis: &str, name: &str, weight: f64) -> CriterionDraft {
    CriterionDraft {
        id: None,
        axis: axis.to_string(),
        name: name.to_string(),
        description: String::new(),
        weight,
        min_value: 0.0,
        max_value: 10.0,
        sort_order: 0,
        statuses: Vec::new(),
    }
}

pub(super) fn pipeline_draft() -> MatrixDraft {
    let mut relationship = criterion_draft("y", "Relationship", 1.0);
    relationship.statuses = vec![
        StatusDraft {
            label: "Cold".to_string(),
            weight: 1.0,
            sort_order: 1,
        },
        StatusDraft {
            label: "Warm".to_string(),
            weight: 6.0,
            sort_order: 2,
        },
    ];
    MatrixDraft {
        name: "Pipeline".to_string(),
        description: "Quarterly review".to_string(),
        criteria: vec![criterion_draft("x", "Budget", 2.0), relationship],
    }
}

pub(super) fn seeded_matrix(service: &MatrixService<SqliteStore>) -> MatrixDetail {
    service
        .create(&owner(), pipeline_draft())
        .expect("matrix created")
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

pub(super) fn empty_request(method: &str, uri: &str, actor: &Actor) -> Request<Body> {
    Request::builder()
        .method(method)
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

pub(super) struct UnavailableRepository;

impl UnavailableRepository {
    fn down<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl MatrixRepository for UnavailableRepository {
    fn insert_matrix(&self, _matrix: NewMatrix) -> Result<MatrixId, RepositoryError> {
        Self::down()
    }

    fn fetch_matrix(&self, _id: MatrixId) -> Result<Option<MatrixDetail>, RepositoryError> {
        Self::down()
    }

    fn list_matrices(
        &self,
        _organization_id: OrganizationId,
    ) -> Result<Vec<MatrixSummary>, RepositoryError> {
        Self::down()
    }

    fn apply_changes(&self, _id: MatrixId, _changes: &MatrixChanges) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn update_axis_names(
        &self,
        _id: MatrixId,
        _axis_x_name: &str,
        _axis_y_name: &str,
    ) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn deactivate_criterion(
        &self,
        _matrix_id: MatrixId,
        _criterion_id: CriterionId,
    ) -> Result<bool, RepositoryError> {
        Self::down()
    }

    fn mark_deleted(&self, _id: MatrixId, _at: DateTime<Utc>) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn delete_stats(&self, _id: MatrixId) -> Result<Option<DeleteStats>, RepositoryError> {
        Self::down()
    }

    fn purge_matrix(&self, _id: MatrixId) -> Result<CascadeOutcome, RepositoryError> {
        Self::down()
    }

    fn expired_matrices(&self, _cutoff: DateTime<Utc>) -> Result<Vec<MatrixId>, RepositoryError> {
        Self::down()
    }
}
