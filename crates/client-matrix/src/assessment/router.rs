use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::clients::router::client_error_response;
use crate::clients::{ClientRepository, NewClient};
use crate::http::{actor_from_headers, error_response};
use crate::matrices::router::matrix_error_response;
use crate::matrices::{MatrixId, MatrixRepository};
use crate::scoring::CriterionId;

use super::flow::{AssessmentError, AssessmentFlow};
use super::session::{ChatUserId, SessionStore};

#[derive(Debug, Deserialize)]
pub(crate) struct StartRequest {
    chat_user_id: i64,
    matrix_id: MatrixId,
    client: NewClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    criterion_id: CriterionId,
    status_index: usize,
}

/// Endpoints driven by the chat bot gateway; every call carries the operator's identity headers.
pub fn assessment_router<S, C, M>(flow: Arc<AssessmentFlow<S, C, M>>) -> Router
where
    S: SessionStore + 'static,
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(start_handler::<S, C, M>))
        .route(
            "/api/v1/assessments/:chat_user_id/answers",
            post(answer_handler::<S, C, M>),
        )
        .route(
            "/api/v1/assessments/:chat_user_id/cancel",
            post(cancel_handler::<S, C, M>),
        )
        .with_state(flow)
}

pub(crate) async fn start_handler<S, C, M>(
    State(flow): State<Arc<AssessmentFlow<S, C, M>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<StartRequest>,
) -> Response
where
    S: SessionStore + 'static,
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match flow.start(
        &actor,
        ChatUserId(request.chat_user_id),
        request.client,
        request.matrix_id,
        Utc::now(),
    ) {
        Ok(prompt) => (StatusCode::CREATED, axum::Json(prompt)).into_response(),
        Err(error) => assessment_error_response(error),
    }
}

pub(crate) async fn answer_handler<S, C, M>(
    State(flow): State<Arc<AssessmentFlow<S, C, M>>>,
    Path(chat_user_id): Path<i64>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: SessionStore + 'static,
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match flow.choose(
        &actor,
        ChatUserId(chat_user_id),
        request.criterion_id,
        request.status_index,
        Utc::now(),
    ) {
        Ok(step) => (StatusCode::OK, axum::Json(step)).into_response(),
        Err(error) => assessment_error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, C, M>(
    State(flow): State<Arc<AssessmentFlow<S, C, M>>>,
    Path(chat_user_id): Path<i64>,
    headers: HeaderMap,
) -> Response
where
    S: SessionStore + 'static,
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match flow.cancel(&actor, ChatUserId(chat_user_id), Utc::now()) {
        Ok(client) => (StatusCode::OK, axum::Json(client)).into_response(),
        Err(error) => assessment_error_response(error),
    }
}

fn assessment_error_response(error: AssessmentError) -> Response {
    match error {
        AssessmentError::SessionExpired(_) => error_response(StatusCode::GONE, error.to_string()),
        AssessmentError::Validation(_) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
        AssessmentError::Matrix(inner) => matrix_error_response(inner),
        AssessmentError::Client(inner) => client_error_response(inner),
        AssessmentError::Repository(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}
