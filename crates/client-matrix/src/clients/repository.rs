use crate::access::{OrganizationId, UserId};
use crate::matrices::MatrixDetail;
use crate::repository::RepositoryError;
use crate::scoring::{CriterionId, ScoreOutcome};

use super::domain::{Client, ClientDetail, ClientFilter, ClientId, ClientUpdate, NewClient, ScoreInput};

/// Computes a client's position from its matrix and every score recorded for it.
pub type ScoreEvaluator<'a> = &'a dyn Fn(&MatrixDetail, &[(CriterionId, f64)]) -> ScoreOutcome;

/// Storage abstraction for clients and their per-criterion scores.
pub trait ClientRepository: Send + Sync {
    fn insert_client(
        &self,
        organization_id: OrganizationId,
        created_by: UserId,
        client: &NewClient,
    ) -> Result<ClientId, RepositoryError>;
    fn fetch_client(&self, id: ClientId) -> Result<Option<ClientDetail>, RepositoryError>;
    fn list_clients(
        &self,
        organization_id: OrganizationId,
        filter: &ClientFilter,
    ) -> Result<Vec<Client>, RepositoryError>;
    fn update_profile(&self, id: ClientId, update: &ClientUpdate) -> Result<(), RepositoryError>;
    fn deactivate_client(&self, id: ClientId) -> Result<(), RepositoryError>;
    /// Case-insensitive lookup among active clients of the organization.
    fn active_company_exists(
        &self,
        organization_id: OrganizationId,
        company_name: &str,
    ) -> Result<bool, RepositoryError>;
    /// Upserts `scores`, then re-evaluates and stores the client's position, all in one
    /// transaction. Returns `None` when the client is not linked to a matrix.
    fn record_scores(
        &self,
        id: ClientId,
        scores: &[ScoreInput],
        evaluate: ScoreEvaluator<'_>,
    ) -> Result<Option<ScoreOutcome>, RepositoryError>;
}
