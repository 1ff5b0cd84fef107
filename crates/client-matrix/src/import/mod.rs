//! Bulk client import from CSV exports.

mod mapping;
mod normalizer;
mod parser;
pub mod router;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::access::Actor;
use crate::clients::{ClientRepository, ClientService, ClientServiceError, NewClient, ScoreInput};
use crate::matrices::{
    CriterionDraft, MatrixEdit, MatrixId, MatrixRepository, MatrixService, MatrixServiceError,
};
use crate::scoring::{Axis, CriterionId, ScoringMode};

pub use mapping::{ColumnTarget, ImportMapping};
pub use router::import_router;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid import request: {0}")]
    Invalid(String),
    #[error("could not prepare target matrix: {0}")]
    Matrix(#[from] MatrixServiceError),
    #[error("could not store imported client: {0}")]
    Client(#[from] ClientServiceError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Imports client rows into a matrix, creating any criteria the mapping names.
pub struct ClientImporter<C, M> {
    matrices: Arc<MatrixService<M>>,
    clients: Arc<ClientService<C, M>>,
}

impl<C, M> ClientImporter<C, M>
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    pub fn new(matrices: Arc<MatrixService<M>>, clients: Arc<ClientService<C, M>>) -> Self {
        Self { matrices, clients }
    }

    /// Mapping guessed from the header row of `reader`.
    pub fn suggest_mapping<R: Read>(reader: R) -> Result<ImportMapping, ImportError> {
        let headers = parser::read_headers(reader)?;
        Ok(ImportMapping::suggest(headers.iter().map(String::as_str)))
    }

    pub fn import_path<P: AsRef<Path>>(
        &self,
        actor: &Actor,
        matrix_id: MatrixId,
        mapping: &ImportMapping,
        path: P,
    ) -> Result<ImportSummary, ImportError> {
        let file = std::fs::File::open(path)?;
        self.import_reader(actor, matrix_id, mapping, file)
    }

    pub fn import_reader<R: Read>(
        &self,
        actor: &Actor,
        matrix_id: MatrixId,
        mapping: &ImportMapping,
        reader: R,
    ) -> Result<ImportSummary, ImportError> {
        if mapping.is_empty() {
            return Err(ImportError::Invalid(
                "mapping does not assign any column".to_string(),
            ));
        }
        let rows = parser::parse_rows(reader, mapping)?;
        let criteria = self.resolve_criteria(actor, matrix_id, &mapping.criterion_names())?;

        let mut summary = ImportSummary {
            total: rows.len(),
            ..ImportSummary::default()
        };

        for row in rows {
            let company_name = row.client.company_name.trim();
            if company_name.is_empty() || self.clients.company_exists(actor, company_name)? {
                summary.skipped += 1;
                continue;
            }

            let scores: Vec<ScoreInput> = row
                .scores
                .iter()
                .filter_map(|(name, score)| {
                    criteria.get(name).map(|criterion_id| ScoreInput {
                        criterion_id: *criterion_id,
                        score: *score,
                        comment: String::new(),
                    })
                })
                .collect();
            let client = NewClient {
                matrix_id: Some(matrix_id),
                ..row.client
            };

            match self
                .clients
                .create_client(actor, client, scores, ScoringMode::ValueRange)
            {
                Ok(_) => summary.imported += 1,
                Err(ClientServiceError::Validation(reason)) => {
                    warn!(%reason, "skipping import row");
                    summary.skipped += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(
            matrix_id = matrix_id.0,
            imported = summary.imported,
            skipped = summary.skipped,
            total = summary.total,
            "client import finished"
        );
        Ok(summary)
    }

    /// Maps criterion names to ids, creating missing ones on the x axis with range 0..10.
    fn resolve_criteria(
        &self,
        actor: &Actor,
        matrix_id: MatrixId,
        names: &[String],
    ) -> Result<HashMap<String, CriterionId>, ImportError> {
        let mut detail = self.matrices.get(actor, matrix_id)?;
        if detail.matrix.is_soft_deleted() {
            return Err(ImportError::Invalid(format!(
                "matrix {matrix_id} is scheduled for deletion"
            )));
        }

        let missing: Vec<&String> = names
            .iter()
            .filter(|name| detail.criterion_named(name).is_none())
            .collect();
        if !missing.is_empty() {
            let next_order = detail
                .criteria
                .iter()
                .map(|criterion| criterion.sort_order)
                .max()
                .unwrap_or(0);
            let drafts = missing
                .iter()
                .zip(1..)
                .map(|(name, offset)| CriterionDraft {
                    id: None,
                    axis: Axis::X.label().to_string(),
                    name: (*name).clone(),
                    description: String::new(),
                    weight: 1.0,
                    min_value: 0.0,
                    max_value: 10.0,
                    sort_order: next_order + offset,
                    statuses: Vec::new(),
                })
                .collect();
            info!(matrix_id = matrix_id.0, created = missing.len(), "creating criteria for import");
            detail = self.matrices.apply_matrix_edit(
                actor,
                matrix_id,
                MatrixEdit {
                    criteria: drafts,
                    ..MatrixEdit::default()
                },
            )?;
        }

        Ok(names
            .iter()
            .filter_map(|name| {
                detail
                    .criterion_named(name)
                    .map(|criterion| (name.clone(), criterion.id))
            })
            .collect())
    }
}
