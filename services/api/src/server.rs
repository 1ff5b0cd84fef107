use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_application_routes;
use crate::sweeper;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use client_matrix::config::AppConfig;
use client_matrix::error::AppError;
use client_matrix::storage::SqliteStore;
use client_matrix::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = SqliteStore::open(&config.storage.database_path)?;
    let services = Services::build(store, &config.retention, &config.assessment);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store: services.store.clone(),
    };

    tokio::spawn(sweeper::run_periodic(
        services.clone(),
        config.retention.sweep_interval(),
    ));

    let app = with_application_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.storage.database_path.display(),
        retention_days = config.retention.retention_days,
        "client matrix service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
