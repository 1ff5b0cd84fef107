use super::common::*;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::clients::{client_router, ClientService};
use crate::scoring::ScoringMode;
use crate::storage::SqliteStore;

#[tokio::test]
async fn create_route_scores_and_classifies() {
    let fx = fixture();
    let router = client_router(fx.clients.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/clients",
            &member(),
            &json!({
                "company_name": "Acme",
                "matrix_id": fx.matrix.matrix.id,
                "scores": [
                    {"criterion_id": fx.criterion("Budget"), "score": 8},
                    {"criterion_id": fx.criterion("Reach"), "score": 4},
                    {"criterion_id": fx.criterion("Relationship"), "score": 3, "comment": "met once"}
                ]
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["client"]["quadrant"], "grow");
    assert_eq!(body["client"]["score_x"], 6.0);
}

#[tokio::test]
async fn list_route_applies_query_filter() {
    let fx = fixture();
    fx.clients
        .create_client(&owner(), fx.linked("Grower"), fx.growth_scores(), ScoringMode::ValueRange)
        .expect("created");
    fx.clients
        .create_client(&owner(), fx.linked("Idle"), Vec::new(), ScoringMode::ValueRange)
        .expect("created");
    let router = client_router(fx.clients.clone());

    let response = router
        .oneshot(get_request("/api/v1/clients?quadrant=grow", &owner()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let clients = body.as_array().expect("array");
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["company_name"], "Grower");
}

#[tokio::test]
async fn scoring_a_foreign_client_is_forbidden() {
    let fx = fixture();
    let id = fx
        .clients
        .create_client(&owner(), fx.linked("Acme"), Vec::new(), ScoringMode::ValueRange)
        .expect("created")
        .client
        .id;
    let router = client_router(fx.clients.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/clients/{}/scores", id.0),
            &outsider(),
            &json!({"scores": []}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_client_is_not_found() {
    let fx = fixture();
    let router = client_router(fx.clients.clone());

    let response = router
        .oneshot(get_request("/api/v1/clients/999", &owner()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_route_updates_profile_fields() {
    let fx = fixture();
    let id = fx
        .clients
        .create_client(&owner(), fx.linked("Acme"), Vec::new(), ScoringMode::ValueRange)
        .expect("created")
        .client
        .id;
    let router = client_router(fx.clients.clone());

    let response = router
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/clients/{}", id.0),
            &owner(),
            &json!({"contact_person": "Dana", "phone": "+1 555 0100"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["client"]["contact_person"], "Dana");
    assert_eq!(body["client"]["company_name"], "Acme");
}

#[tokio::test]
async fn repository_outage_maps_to_internal_error() {
    let matrices = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let service = Arc::new(ClientService::new(Arc::new(UnavailableClients), matrices));
    let router = client_router(service);

    let response = router
        .oneshot(get_request("/api/v1/clients", &owner()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
