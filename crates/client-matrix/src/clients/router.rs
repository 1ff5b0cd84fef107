use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::http::{actor_from_headers, error_response};
use crate::matrices::MatrixRepository;
use crate::scoring::ScoringMode;

use super::domain::{ClientDetail, ClientFilter, ClientId, ClientUpdate, NewClient, ScoreInput};
use super::repository::ClientRepository;
use super::service::{ClientService, ClientServiceError};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateClientRequest {
    #[serde(flatten)]
    client: NewClient,
    #[serde(default)]
    scores: Vec<ScoreInput>,
    #[serde(default)]
    mode: ScoringMode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    #[serde(default)]
    scores: Vec<ScoreInput>,
    #[serde(default)]
    mode: ScoringMode,
}

pub fn client_router<C, M>(service: Arc<ClientService<C, M>>) -> Router
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/clients",
            get(list_handler::<C, M>).post(create_handler::<C, M>),
        )
        .route(
            "/api/v1/clients/:client_id",
            get(get_handler::<C, M>).patch(update_handler::<C, M>),
        )
        .route(
            "/api/v1/clients/:client_id/scores",
            post(score_handler::<C, M>),
        )
        .route(
            "/api/v1/clients/:client_id/deactivate",
            post(deactivate_handler::<C, M>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    Query(filter): Query<ClientFilter>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.list_clients(&actor, &filter) {
        Ok(clients) => (StatusCode::OK, axum::Json(clients)).into_response(),
        Err(error) => client_error_response(error),
    }
}

pub(crate) async fn create_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<CreateClientRequest>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.create_client(&actor, request.client, request.scores, request.mode) {
        Ok(detail) => (StatusCode::CREATED, axum::Json(detail)).into_response(),
        Err(error) => client_error_response(error),
    }
}

pub(crate) async fn get_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    Path(client_id): Path<i64>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(service.get_client(&actor, ClientId(client_id)))
}

pub(crate) async fn update_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    Path(client_id): Path<i64>,
    axum::Json(update): axum::Json<ClientUpdate>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(service.update_client(&actor, ClientId(client_id), update))
}

pub(crate) async fn score_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    Path(client_id): Path<i64>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(service.score_client(&actor, ClientId(client_id), request.scores, request.mode))
}

pub(crate) async fn deactivate_handler<C, M>(
    State(service): State<Arc<ClientService<C, M>>>,
    headers: HeaderMap,
    Path(client_id): Path<i64>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(service.deactivate_client(&actor, ClientId(client_id)))
}

fn respond(result: Result<ClientDetail, ClientServiceError>) -> Response {
    match result {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => client_error_response(error),
    }
}

pub(crate) fn client_error_response(error: ClientServiceError) -> Response {
    let status = match &error {
        ClientServiceError::NotFound(_) | ClientServiceError::MatrixNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ClientServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ClientServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ClientServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}
