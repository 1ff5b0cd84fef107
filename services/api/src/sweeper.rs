use crate::cli::PurgeArgs;
use crate::infra::Services;
use chrono::{DateTime, Duration, Utc};
use client_matrix::config::AppConfig;
use client_matrix::error::AppError;
use client_matrix::matrices::PurgeReport;
use client_matrix::storage::SqliteStore;
use client_matrix::telemetry;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepSummary {
    pub(crate) matrices: PurgeReport,
    pub(crate) expired_sessions: usize,
}

/// One retention pass over matrices and assessment sessions.
pub(crate) fn sweep(
    services: &Services,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<SweepSummary, AppError> {
    let matrices = services.matrices.purge_expired_matrices(now, retention)?;
    let expired_sessions = services.assessments.purge_expired_sessions(now)?;
    Ok(SweepSummary {
        matrices,
        expired_sessions,
    })
}

pub(crate) async fn run_periodic(services: Services, every: std::time::Duration) {
    let retention = services.matrices.retention();
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match sweep(&services, Utc::now(), retention) {
            Ok(summary) => debug!(
                purged = summary.matrices.matrices_purged,
                expired_sessions = summary.expired_sessions,
                "retention sweep finished"
            ),
            Err(error) => warn!(%error, "retention sweep failed"),
        }
    }
}

pub(crate) fn run_once(args: PurgeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(database) = args.database {
        config.storage.database_path = database;
    }
    if let Some(days) = args.retention_days {
        config.retention.retention_days = days;
    }
    telemetry::init(&config.telemetry)?;

    let store = SqliteStore::open(&config.storage.database_path)?;
    let services = Services::build(store, &config.retention, &config.assessment);
    let summary = sweep(&services, Utc::now(), config.retention.retention())?;

    info!(
        purged = summary.matrices.matrices_purged,
        expired_sessions = summary.expired_sessions,
        "manual purge finished"
    );
    println!(
        "Purged {} matrices ({} criteria, {} statuses, {} scores, {} clients unlinked); removed {} expired sessions",
        summary.matrices.matrices_purged,
        summary.matrices.counts.deleted_criteria,
        summary.matrices.counts.deleted_statuses,
        summary.matrices.counts.deleted_client_scores,
        summary.matrices.counts.unlinked_clients,
        summary.expired_sessions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fixtures::services;
    use chrono::TimeZone;
    use client_matrix::access::{Actor, OrganizationId, Role, UserId};

    fn owner() -> Actor {
        Actor {
            organization_id: OrganizationId(1),
            user_id: UserId(1),
            role: Role::Owner,
        }
    }

    #[test]
    fn sweep_purges_matrices_past_retention() {
        let services = services();
        let deleted_at = Utc
            .with_ymd_and_hms(2024, 2, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        let matrix = services
            .matrices
            .create_custom(&owner(), "Old", "")
            .expect("matrix");
        services
            .matrices
            .soft_delete(&owner(), matrix.matrix.id, deleted_at)
            .expect("soft delete");

        let retention = services.matrices.retention();
        let early = sweep(&services, deleted_at + Duration::days(1), retention).expect("sweep");
        assert_eq!(early.matrices.matrices_purged, 0);

        let late = sweep(&services, deleted_at + Duration::days(10), retention).expect("sweep");
        assert_eq!(late.matrices.matrices_purged, 1);
        assert_eq!(late.matrices.counts.deleted_criteria, 1);
        assert_eq!(late.expired_sessions, 0);
    }
}
