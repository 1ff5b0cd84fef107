use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::http::{actor_from_headers, error_response};
use crate::scoring::{CriterionId, QuadrantRule};

use super::domain::{AxisNames, MatrixDetail, MatrixDraft, MatrixEdit, MatrixId};
use super::repository::MatrixRepository;
use super::service::{MatrixService, MatrixServiceError};

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateRequest {
    template_key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RulesRequest {
    #[serde(default)]
    rules: Vec<QuadrantRule>,
}

/// Router exposing matrix configuration and deletion endpoints.
pub fn matrix_router<R>(service: Arc<MatrixService<R>>) -> Router
where
    R: MatrixRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/matrices",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/v1/matrices/templates", get(templates_handler::<R>))
        .route(
            "/api/v1/matrices/from-template",
            post(from_template_handler::<R>),
        )
        .route("/api/v1/matrices/custom", post(custom_handler::<R>))
        .route("/api/v1/matrices/purge", post(purge_handler::<R>))
        .route(
            "/api/v1/matrices/:matrix_id",
            get(get_handler::<R>)
                .patch(update_handler::<R>)
                .delete(soft_delete_handler::<R>),
        )
        .route(
            "/api/v1/matrices/:matrix_id/axis-names",
            put(axis_names_handler::<R>),
        )
        .route(
            "/api/v1/matrices/:matrix_id/quadrant-rules",
            put(rules_handler::<R>),
        )
        .route(
            "/api/v1/matrices/:matrix_id/criteria/:criterion_id",
            delete(remove_criterion_handler::<R>),
        )
        .route(
            "/api/v1/matrices/:matrix_id/permanent",
            delete(permanent_delete_handler::<R>),
        )
        .route(
            "/api/v1/matrices/:matrix_id/delete-stats",
            get(delete_stats_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.list(&actor) {
        Ok(matrices) => (StatusCode::OK, axum::Json(matrices)).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

pub(crate) async fn templates_handler<R>(State(service): State<Arc<MatrixService<R>>>) -> Response
where
    R: MatrixRepository + 'static,
{
    let templates: Vec<_> = service
        .templates()
        .templates()
        .iter()
        .map(|template| {
            json!({
                "key": template.key,
                "name": template.name,
                "description": template.description,
                "criteria_count": template.criteria.len(),
            })
        })
        .collect();
    (StatusCode::OK, axum::Json(templates)).into_response()
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<MatrixDraft>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_created(service.create(&actor, draft))
}

pub(crate) async fn from_template_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<TemplateRequest>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_created(service.create_from_template(
        &actor,
        &request.template_key,
        &request.name,
        &request.description,
    ))
}

pub(crate) async fn custom_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<CustomRequest>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_created(service.create_custom(&actor, &request.name, &request.description))
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_detail(service.get(&actor, MatrixId(matrix_id)))
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
    axum::Json(edit): axum::Json<MatrixEdit>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_detail(service.apply_matrix_edit(&actor, MatrixId(matrix_id), edit))
}

pub(crate) async fn axis_names_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
    axum::Json(names): axum::Json<AxisNames>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_detail(service.update_axis_names(&actor, MatrixId(matrix_id), names))
}

pub(crate) async fn rules_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
    axum::Json(request): axum::Json<RulesRequest>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_detail(service.replace_quadrant_rules(&actor, MatrixId(matrix_id), request.rules))
}

pub(crate) async fn remove_criterion_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path((matrix_id, criterion_id)): Path<(i64, i64)>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond_detail(service.remove_criterion(
        &actor,
        MatrixId(matrix_id),
        CriterionId(criterion_id),
    ))
}

pub(crate) async fn soft_delete_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.soft_delete(&actor, MatrixId(matrix_id), Utc::now()) {
        Ok(matrix) => {
            let payload = json!({
                "id": matrix.id,
                "deleted_at": matrix.deleted_at,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => matrix_error_response(error),
    }
}

pub(crate) async fn permanent_delete_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.delete_permanently(&actor, MatrixId(matrix_id)) {
        Ok(counts) => (StatusCode::OK, axum::Json(counts)).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

pub(crate) async fn delete_stats_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
    Path(matrix_id): Path<i64>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.delete_stats(&actor, MatrixId(matrix_id)) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

pub(crate) async fn purge_handler<R>(
    State(service): State<Arc<MatrixService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    if !actor.role.can_delete_matrices() {
        return error_response(StatusCode::FORBIDDEN, "role may not purge matrices");
    }
    match service.purge_expired_matrices(Utc::now(), service.retention()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

fn respond_created(result: Result<MatrixDetail, MatrixServiceError>) -> Response {
    match result {
        Ok(detail) => (StatusCode::CREATED, axum::Json(detail_view(&detail))).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

fn respond_detail(result: Result<MatrixDetail, MatrixServiceError>) -> Response {
    match result {
        Ok(detail) => (StatusCode::OK, axum::Json(detail_view(&detail))).into_response(),
        Err(error) => matrix_error_response(error),
    }
}

fn detail_view(detail: &MatrixDetail) -> serde_json::Value {
    json!({
        "matrix": detail.matrix,
        "axis_x_name": detail.matrix.axis_x_label(),
        "axis_y_name": detail.matrix.axis_y_label(),
        "criteria": detail.criteria,
        "quadrant_rules": detail.quadrant_rules,
        "policy": detail.policy(),
    })
}

pub(crate) fn matrix_error_response(error: MatrixServiceError) -> Response {
    let status = match &error {
        MatrixServiceError::NotFound(_) | MatrixServiceError::CriterionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        MatrixServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        MatrixServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        MatrixServiceError::NotSoftDeleted(_) => StatusCode::CONFLICT,
        MatrixServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}
