use client_matrix::assessment::AssessmentFlow;
use client_matrix::clients::ClientService;
use client_matrix::config::{AssessmentConfig, RetentionConfig};
use client_matrix::import::ClientImporter;
use client_matrix::matrices::MatrixService;
use client_matrix::storage::SqliteStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Matrices = MatrixService<SqliteStore>;
pub(crate) type Clients = ClientService<SqliteStore, SqliteStore>;
pub(crate) type Importer = ClientImporter<SqliteStore, SqliteStore>;
pub(crate) type Assessments = AssessmentFlow<SqliteStore, SqliteStore, SqliteStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: SqliteStore,
}

/// Every service wired against one shared SQLite store.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) store: SqliteStore,
    pub(crate) matrices: Arc<Matrices>,
    pub(crate) clients: Arc<Clients>,
    pub(crate) importer: Arc<Importer>,
    pub(crate) assessments: Arc<Assessments>,
}

impl Services {
    pub(crate) fn build(
        store: SqliteStore,
        retention: &RetentionConfig,
        assessment: &AssessmentConfig,
    ) -> Self {
        let shared = Arc::new(store.clone());
        let matrices =
            Arc::new(MatrixService::new(shared.clone()).with_retention(retention.retention()));
        let clients = Arc::new(ClientService::new(shared.clone(), shared.clone()));
        let importer = Arc::new(ClientImporter::new(matrices.clone(), clients.clone()));
        let assessments = Arc::new(
            AssessmentFlow::new(shared, matrices.clone(), clients.clone())
                .with_ttl(assessment.session_ttl()),
        );

        Self {
            store,
            matrices,
            clients,
            importer,
            assessments,
        }
    }
}
