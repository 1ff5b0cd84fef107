use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use client_matrix::access::{Actor, OrganizationId, Role, UserId};
use client_matrix::clients::{ClientFilter, ClientService, NewClient, ScoreInput};
use client_matrix::matrices::{MatrixService, MatrixServiceError};
use client_matrix::scoring::ScoringMode;
use client_matrix::storage::SqliteStore;

fn admin() -> Actor {
    Actor {
        organization_id: OrganizationId(9),
        user_id: UserId(1),
        role: Role::Admin,
    }
}

#[test]
fn template_matrix_survives_until_retention_sweep() {
    let dir = std::env::temp_dir().join(format!("client-matrix-lifecycle-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let store = Arc::new(SqliteStore::open(dir.join("matrix.db")).expect("file store"));
    let matrices = Arc::new(MatrixService::new(store.clone()));
    let clients = ClientService::new(store.clone(), store);

    let matrix = matrices
        .create_from_template(&admin(), "account_growth", "Key accounts", "")
        .expect("template matrix");
    let scores: Vec<ScoreInput> = matrix
        .criteria
        .iter()
        .map(|criterion| ScoreInput {
            criterion_id: criterion.id,
            score: 7.0,
            comment: String::new(),
        })
        .collect();
    let client = clients
        .create_client(
            &admin(),
            NewClient {
                company_name: "Initech".to_string(),
                matrix_id: Some(matrix.matrix.id),
                ..NewClient::default()
            },
            scores,
            ScoringMode::ValueRange,
        )
        .expect("client");
    assert_eq!(client.client.quadrant.as_deref(), Some("focus"));

    let deleted_at = Utc
        .with_ymd_and_hms(2024, 1, 10, 12, 0, 0)
        .single()
        .expect("timestamp");
    matrices
        .soft_delete(&admin(), matrix.matrix.id, deleted_at)
        .expect("soft delete");

    let early = matrices
        .purge_expired_matrices(deleted_at + Duration::days(2), matrices.retention())
        .expect("early sweep");
    assert_eq!(early.matrices_purged, 0);
    assert!(matrices.get(&admin(), matrix.matrix.id).is_ok());

    let report = matrices
        .purge_expired_matrices(deleted_at + Duration::days(4), matrices.retention())
        .expect("sweep");
    assert_eq!(report.matrices_purged, 1);
    assert_eq!(report.counts.deleted_criteria, matrix.criteria.len());
    assert_eq!(report.counts.deleted_client_scores, matrix.criteria.len());
    assert_eq!(report.counts.unlinked_clients, 1);

    assert!(matches!(
        matrices.get(&admin(), matrix.matrix.id),
        Err(MatrixServiceError::NotFound(_))
    ));
    let remaining = clients
        .list_clients(&admin(), &ClientFilter::default())
        .expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].matrix_id, None);
    assert_eq!(remaining[0].quadrant, None);
    assert_eq!(remaining[0].score_x, 0.0);

    let _ = std::fs::remove_dir_all(dir);
}
