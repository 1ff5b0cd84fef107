//! Matrix configuration: criteria, statuses, quadrant rules and the two-phase deletion lifecycle.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod templates;

#[cfg(test)]
mod tests;

pub use domain::{
    AxisNames, CascadeOutcome, CriterionDraft, CriterionUpsert, DeleteStats, Matrix, MatrixChanges,
    MatrixDetail, MatrixDraft, MatrixEdit, MatrixId, MatrixSummary, NewCriterion, NewMatrix,
    NewStatus, PurgeCounts, PurgeReport, StatusDraft, DEFAULT_AXIS_X_NAME, DEFAULT_AXIS_Y_NAME,
};
pub use repository::MatrixRepository;
pub use router::matrix_router;
pub use service::{MatrixService, MatrixServiceError, DEFAULT_RETENTION_DAYS};
pub use templates::{MatrixTemplate, TemplateCatalog, TemplateCriterion};
