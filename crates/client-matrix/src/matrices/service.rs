use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::access::Actor;
use crate::repository::RepositoryError;
use crate::scoring::{CriterionId, QuadrantRule};

use super::domain::{
    AxisNames, CascadeOutcome, CriterionUpsert, DeleteStats, Matrix, MatrixChanges, MatrixDetail,
    MatrixDraft, MatrixEdit, MatrixId, MatrixSummary, NewCriterion, NewMatrix, PurgeCounts,
    PurgeReport,
};
use super::repository::MatrixRepository;
use super::templates::{custom_matrix_seed, TemplateCatalog};

/// Retention window between a soft delete and the permanent purge.
pub const DEFAULT_RETENTION_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Manage,
    Delete,
}

/// Orchestrates matrix creation, edits and two-phase deletion.
///
/// Edits never recompute client scores; stored client positions stay as they are until
/// the client's own scores are written again.
pub struct MatrixService<R> {
    repository: Arc<R>,
    templates: TemplateCatalog,
    retention: Duration,
}

impl<R> MatrixService<R>
where
    R: MatrixRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            templates: TemplateCatalog::standard(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Retention window used by scheduled and on-demand sweeps.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn list(&self, actor: &Actor) -> Result<Vec<MatrixSummary>, MatrixServiceError> {
        Ok(self.repository.list_matrices(actor.organization_id)?)
    }

    pub fn get(&self, actor: &Actor, id: MatrixId) -> Result<MatrixDetail, MatrixServiceError> {
        self.load(actor, id, Access::Read)
    }

    /// Create a matrix with its initial criteria; blank-named criteria are skipped.
    pub fn create(
        &self,
        actor: &Actor,
        draft: MatrixDraft,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        ensure_role(actor, Access::Manage)?;
        let name = required_name(&draft.name)?;

        if draft.criteria.is_empty() {
            return Err(MatrixServiceError::Validation(
                "at least one criterion is required".to_string(),
            ));
        }
        let criteria: Vec<NewCriterion> =
            draft.criteria.iter().filter_map(NewCriterion::from_draft).collect();

        self.insert(
            actor,
            NewMatrix {
                organization_id: actor.organization_id,
                created_by: actor.user_id,
                name,
                description: draft.description.trim().to_string(),
                template_key: None,
                criteria,
            },
        )
    }

    pub fn create_from_template(
        &self,
        actor: &Actor,
        template_key: &str,
        name: &str,
        description: &str,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        ensure_role(actor, Access::Manage)?;
        let name = required_name(name)?;
        let template = self
            .templates
            .find(template_key)
            .ok_or_else(|| MatrixServiceError::Validation(format!("unknown template '{template_key}'")))?;

        self.insert(
            actor,
            NewMatrix {
                organization_id: actor.organization_id,
                created_by: actor.user_id,
                name,
                description: description.trim().to_string(),
                template_key: Some(template.key.to_string()),
                criteria: template
                    .criteria
                    .iter()
                    .map(|criterion| criterion.to_new_criterion())
                    .collect(),
            },
        )
    }

    /// Create an empty custom matrix seeded with a single universal criterion.
    pub fn create_custom(
        &self,
        actor: &Actor,
        name: &str,
        description: &str,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        ensure_role(actor, Access::Manage)?;
        let name = required_name(name)?;

        self.insert(
            actor,
            NewMatrix {
                organization_id: actor.organization_id,
                created_by: actor.user_id,
                name,
                description: description.trim().to_string(),
                template_key: None,
                criteria: vec![custom_matrix_seed()],
            },
        )
    }

    /// Apply a partial edit: rename, merge criteria by id and optionally replace all rules.
    pub fn apply_matrix_edit(
        &self,
        actor: &Actor,
        id: MatrixId,
        edit: MatrixEdit,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        let current = self.load(actor, id, Access::Manage)?;

        let name = match edit.name.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(name) => Some(name.to_string()),
        };
        let description = edit.description.map(|description| description.trim().to_string());

        let mut criteria = Vec::with_capacity(edit.criteria.len());
        for draft in &edit.criteria {
            let Some(criterion) = NewCriterion::from_draft(draft) else {
                continue;
            };
            match draft.id {
                Some(criterion_id) if current.criterion(criterion_id).is_some() => {
                    criteria.push(CriterionUpsert::Update(criterion_id, criterion));
                }
                Some(criterion_id) => {
                    warn!(
                        matrix_id = id.0,
                        criterion_id = criterion_id.0,
                        "ignoring edit for criterion outside matrix"
                    );
                }
                None => criteria.push(CriterionUpsert::Insert(criterion)),
            }
        }

        let quadrant_rules = match edit.quadrant_rules {
            Some(rules) => Some(validated_rules(rules)?),
            None => None,
        };

        let changes = MatrixChanges {
            name,
            description,
            criteria,
            quadrant_rules,
        };
        if !changes.is_empty() {
            self.repository.apply_changes(id, &changes)?;
            info!(
                matrix_id = id.0,
                criteria = changes.criteria.len(),
                rules_replaced = changes.quadrant_rules.is_some(),
                "matrix updated"
            );
        }

        self.reload(id)
    }

    /// Replace every quadrant rule of the matrix with `rules`.
    pub fn replace_quadrant_rules(
        &self,
        actor: &Actor,
        id: MatrixId,
        rules: Vec<QuadrantRule>,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        self.apply_matrix_edit(
            actor,
            id,
            MatrixEdit {
                quadrant_rules: Some(rules),
                ..MatrixEdit::default()
            },
        )
    }

    pub fn update_axis_names(
        &self,
        actor: &Actor,
        id: MatrixId,
        names: AxisNames,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        self.load(actor, id, Access::Manage)?;
        self.repository
            .update_axis_names(id, names.axis_x_name.trim(), names.axis_y_name.trim())?;
        self.reload(id)
    }

    /// Retire one criterion. Its recorded client scores stay stored but stop counting
    /// toward either axis from the next scoring cycle on.
    pub fn remove_criterion(
        &self,
        actor: &Actor,
        id: MatrixId,
        criterion_id: CriterionId,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        self.load(actor, id, Access::Manage)?;
        if !self.repository.deactivate_criterion(id, criterion_id)? {
            return Err(MatrixServiceError::CriterionNotFound {
                matrix_id: id,
                criterion_id,
            });
        }
        info!(matrix_id = id.0, criterion_id = criterion_id.0, "criterion removed");
        self.reload(id)
    }

    /// Flag the matrix for deletion; it is purged once the retention window passes.
    pub fn soft_delete(
        &self,
        actor: &Actor,
        id: MatrixId,
        now: DateTime<Utc>,
    ) -> Result<Matrix, MatrixServiceError> {
        self.load(actor, id, Access::Delete)?;
        self.repository.mark_deleted(id, now)?;
        info!(matrix_id = id.0, "matrix soft-deleted");
        Ok(self.reload(id)?.matrix)
    }

    /// Cascade-delete a matrix that has already been soft-deleted.
    pub fn delete_permanently(
        &self,
        actor: &Actor,
        id: MatrixId,
    ) -> Result<PurgeCounts, MatrixServiceError> {
        let current = self.load(actor, id, Access::Delete)?;
        if !current.matrix.is_soft_deleted() {
            return Err(MatrixServiceError::NotSoftDeleted(id));
        }

        match self.repository.purge_matrix(id)? {
            CascadeOutcome::Purged(counts) => {
                info!(matrix_id = id.0, ?counts, "matrix permanently deleted");
                Ok(counts)
            }
            CascadeOutcome::Missing => Err(MatrixServiceError::NotFound(id)),
            CascadeOutcome::NotSoftDeleted => Err(MatrixServiceError::NotSoftDeleted(id)),
        }
    }

    pub fn delete_stats(
        &self,
        actor: &Actor,
        id: MatrixId,
    ) -> Result<DeleteStats, MatrixServiceError> {
        self.load(actor, id, Access::Delete)?;
        self.repository
            .delete_stats(id)?
            .ok_or(MatrixServiceError::NotFound(id))
    }

    /// Purge every matrix soft-deleted before `now - retention`.
    ///
    /// Safe to run concurrently with itself: a matrix removed by another sweep is skipped.
    pub fn purge_expired_matrices(
        &self,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Result<PurgeReport, MatrixServiceError> {
        let cutoff = now - retention;
        let mut report = PurgeReport::default();

        for id in self.repository.expired_matrices(cutoff)? {
            match self.repository.purge_matrix(id)? {
                CascadeOutcome::Purged(counts) => {
                    report.matrices_purged += 1;
                    report.counts += counts;
                }
                CascadeOutcome::Missing | CascadeOutcome::NotSoftDeleted => {}
            }
        }

        if report.matrices_purged > 0 {
            info!(
                purged = report.matrices_purged,
                criteria = report.counts.deleted_criteria,
                unlinked_clients = report.counts.unlinked_clients,
                "expired matrices purged"
            );
        }
        Ok(report)
    }

    fn insert(&self, actor: &Actor, matrix: NewMatrix) -> Result<MatrixDetail, MatrixServiceError> {
        let criteria = matrix.criteria.len();
        let id = self.repository.insert_matrix(matrix)?;
        info!(
            matrix_id = id.0,
            organization_id = actor.organization_id.0,
            criteria,
            "matrix created"
        );
        self.reload(id)
    }

    fn load(
        &self,
        actor: &Actor,
        id: MatrixId,
        access: Access,
    ) -> Result<MatrixDetail, MatrixServiceError> {
        ensure_role(actor, access)?;
        let detail = self
            .repository
            .fetch_matrix(id)?
            .ok_or(MatrixServiceError::NotFound(id))?;

        if !actor.owns(detail.matrix.organization_id) {
            return Err(match access {
                Access::Read => MatrixServiceError::NotFound(id),
                Access::Manage | Access::Delete => MatrixServiceError::Forbidden(
                    "matrix belongs to a different organization".to_string(),
                ),
            });
        }
        Ok(detail)
    }

    fn reload(&self, id: MatrixId) -> Result<MatrixDetail, MatrixServiceError> {
        self.repository
            .fetch_matrix(id)?
            .ok_or(MatrixServiceError::NotFound(id))
    }
}

fn ensure_role(actor: &Actor, access: Access) -> Result<(), MatrixServiceError> {
    let allowed = match access {
        Access::Read => true,
        Access::Manage => actor.role.can_manage_matrices(),
        Access::Delete => actor.role.can_delete_matrices(),
    };
    if allowed {
        Ok(())
    } else {
        Err(MatrixServiceError::Forbidden(format!(
            "role '{}' may not perform this matrix operation",
            actor.role.label()
        )))
    }
}

fn required_name(raw: &str) -> Result<String, MatrixServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MatrixServiceError::Validation(
            "matrix name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn validated_rules(rules: Vec<QuadrantRule>) -> Result<Vec<QuadrantRule>, MatrixServiceError> {
    if rules.is_empty() {
        return Err(MatrixServiceError::Validation(
            "quadrant_rules must not be empty".to_string(),
        ));
    }
    if rules.iter().any(|rule| rule.quadrant.trim().is_empty()) {
        return Err(MatrixServiceError::Validation(
            "every quadrant rule needs a quadrant label".to_string(),
        ));
    }
    Ok(rules
        .into_iter()
        .map(|rule| QuadrantRule {
            quadrant: rule.quadrant.trim().to_string(),
            ..rule
        })
        .collect())
}

/// Error raised by the matrix service.
#[derive(Debug, thiserror::Error)]
pub enum MatrixServiceError {
    #[error("matrix {0} not found")]
    NotFound(MatrixId),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("criterion {} not found in matrix {matrix_id}", .criterion_id.0)]
    CriterionNotFound {
        matrix_id: MatrixId,
        criterion_id: CriterionId,
    },
    #[error("matrix {0} must be soft-deleted before permanent deletion")]
    NotSoftDeleted(MatrixId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
