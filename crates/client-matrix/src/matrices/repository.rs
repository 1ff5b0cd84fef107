use chrono::{DateTime, Utc};

use crate::access::OrganizationId;
use crate::repository::RepositoryError;
use crate::scoring::CriterionId;

use super::domain::{
    CascadeOutcome, DeleteStats, MatrixChanges, MatrixDetail, MatrixId, MatrixSummary, NewMatrix,
};

/// Storage abstraction for matrices and everything they own.
pub trait MatrixRepository: Send + Sync {
    /// Inserts the matrix, its criteria and their statuses atomically.
    fn insert_matrix(&self, matrix: NewMatrix) -> Result<MatrixId, RepositoryError>;
    fn fetch_matrix(&self, id: MatrixId) -> Result<Option<MatrixDetail>, RepositoryError>;
    fn list_matrices(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<MatrixSummary>, RepositoryError>;
    /// Applies an edit atomically. Criterion updates only touch criteria of `id`.
    fn apply_changes(&self, id: MatrixId, changes: &MatrixChanges) -> Result<(), RepositoryError>;
    fn update_axis_names(
        &self,
        id: MatrixId,
        axis_x_name: &str,
        axis_y_name: &str,
    ) -> Result<(), RepositoryError>;
    /// Retires a live criterion of `matrix_id`; returns false when there was none to retire.
    fn deactivate_criterion(
        &self,
        matrix_id: MatrixId,
        criterion_id: CriterionId,
    ) -> Result<bool, RepositoryError>;
    /// Flags the matrix as deleted; an existing flag keeps its original timestamp.
    fn mark_deleted(&self, id: MatrixId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
    fn delete_stats(&self, id: MatrixId) -> Result<Option<DeleteStats>, RepositoryError>;
    /// Cascade-deletes a soft-deleted matrix in dependency order within one transaction.
    fn purge_matrix(&self, id: MatrixId) -> Result<CascadeOutcome, RepositoryError>;
    /// Soft-deleted matrices whose `deleted_at` is strictly before `cutoff`.
    fn expired_matrices(&self, cutoff: DateTime<Utc>) -> Result<Vec<MatrixId>, RepositoryError>;
}
