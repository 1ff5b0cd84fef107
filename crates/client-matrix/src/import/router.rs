use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::clients::router::client_error_response;
use crate::clients::ClientRepository;
use crate::http::{actor_from_headers, error_response};
use crate::matrices::router::matrix_error_response;
use crate::matrices::{MatrixId, MatrixRepository};

use super::{ClientImporter, ImportError, ImportMapping};

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    matrix_id: MatrixId,
    /// Raw CSV text including the header row.
    content: String,
    /// File column → target; when omitted the mapping is guessed from the headers.
    #[serde(default)]
    mapping: Option<BTreeMap<String, String>>,
}

pub fn import_router<C, M>(importer: Arc<ClientImporter<C, M>>) -> Router
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    Router::new()
        .route("/api/v1/import", post(import_handler::<C, M>))
        .with_state(importer)
}

pub(crate) async fn import_handler<C, M>(
    State(importer): State<Arc<ClientImporter<C, M>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ImportRequest>,
) -> Response
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };

    let mapping = match &request.mapping {
        Some(pairs) => {
            match ImportMapping::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
                Ok(mapping) => mapping,
                Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
            }
        }
        None => match ClientImporter::<C, M>::suggest_mapping(Cursor::new(request.content.as_bytes())) {
            Ok(mapping) => mapping,
            Err(error) => return error_response(StatusCode::BAD_REQUEST, error.to_string()),
        },
    };

    match importer.import_reader(
        &actor,
        request.matrix_id,
        &mapping,
        Cursor::new(request.content.as_bytes()),
    ) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(ImportError::Matrix(inner)) => matrix_error_response(inner),
        Err(ImportError::Client(inner)) => client_error_response(inner),
        Err(error @ (ImportError::Csv(_) | ImportError::Invalid(_))) => {
            error_response(StatusCode::BAD_REQUEST, error.to_string())
        }
        Err(error @ ImportError::Io(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}
