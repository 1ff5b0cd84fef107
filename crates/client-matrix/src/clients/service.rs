use std::sync::Arc;

use tracing::{debug, info};

use crate::access::Actor;
use crate::matrices::{MatrixId, MatrixRepository};
use crate::repository::RepositoryError;
use crate::scoring::{evaluate, ScoringMode};

use super::domain::{Client, ClientDetail, ClientFilter, ClientId, ClientUpdate, NewClient, ScoreInput};
use super::repository::ClientRepository;

/// Client profile management and the score → aggregate → classify cycle.
pub struct ClientService<C, M> {
    clients: Arc<C>,
    matrices: Arc<M>,
}

impl<C, M> ClientService<C, M>
where
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    pub fn new(clients: Arc<C>, matrices: Arc<M>) -> Self {
        Self { clients, matrices }
    }

    pub fn create_client(
        &self,
        actor: &Actor,
        client: NewClient,
        scores: Vec<ScoreInput>,
        mode: ScoringMode,
    ) -> Result<ClientDetail, ClientServiceError> {
        let client = client.trimmed();
        if client.company_name.is_empty() {
            return Err(ClientServiceError::Validation(
                "company_name is required".to_string(),
            ));
        }
        if let Some(matrix_id) = client.matrix_id {
            self.ensure_linkable(actor, matrix_id)?;
        }

        let id = self
            .clients
            .insert_client(actor.organization_id, actor.user_id, &client)?;
        info!(client_id = id.0, organization_id = actor.organization_id.0, "client created");

        if !scores.is_empty() {
            self.run_cycle(id, &scores, mode)?;
        }
        self.reload(id)
    }

    pub fn update_client(
        &self,
        actor: &Actor,
        id: ClientId,
        update: ClientUpdate,
    ) -> Result<ClientDetail, ClientServiceError> {
        self.load_for_write(actor, id)?;

        if let Some(name) = &update.company_name {
            if name.trim().is_empty() {
                return Err(ClientServiceError::Validation(
                    "company_name must not be blank".to_string(),
                ));
            }
        }
        if let Some(matrix_id) = update.matrix_id {
            self.ensure_linkable(actor, matrix_id)?;
        }

        if update.touches_profile() {
            self.clients.update_profile(id, &update)?;
        }
        match &update.scores {
            Some(scores) => self.run_cycle(id, scores, update.mode)?,
            None if update.matrix_id.is_some() => self.run_cycle(id, &[], update.mode)?,
            None => {}
        }
        self.reload(id)
    }

    /// Records scores and recomputes the client's position over all of its scores.
    pub fn score_client(
        &self,
        actor: &Actor,
        id: ClientId,
        scores: Vec<ScoreInput>,
        mode: ScoringMode,
    ) -> Result<ClientDetail, ClientServiceError> {
        self.load_for_write(actor, id)?;
        self.run_cycle(id, &scores, mode)?;
        self.reload(id)
    }

    pub fn get_client(&self, actor: &Actor, id: ClientId) -> Result<ClientDetail, ClientServiceError> {
        let detail = self.reload(id)?;
        if !actor.owns(detail.client.organization_id) {
            return Err(ClientServiceError::NotFound(id));
        }
        Ok(detail)
    }

    pub fn list_clients(
        &self,
        actor: &Actor,
        filter: &ClientFilter,
    ) -> Result<Vec<Client>, ClientServiceError> {
        Ok(self.clients.list_clients(actor.organization_id, filter)?)
    }

    pub fn deactivate_client(
        &self,
        actor: &Actor,
        id: ClientId,
    ) -> Result<ClientDetail, ClientServiceError> {
        self.load_for_write(actor, id)?;
        self.clients.deactivate_client(id)?;
        info!(client_id = id.0, "client deactivated");
        self.reload(id)
    }

    /// Whether an active client with this company name already exists in the actor's organization.
    pub fn company_exists(&self, actor: &Actor, company_name: &str) -> Result<bool, ClientServiceError> {
        Ok(self
            .clients
            .active_company_exists(actor.organization_id, company_name.trim())?)
    }

    fn run_cycle(
        &self,
        id: ClientId,
        scores: &[ScoreInput],
        mode: ScoringMode,
    ) -> Result<(), ClientServiceError> {
        let outcome = self.clients.record_scores(id, scores, &|matrix, recorded| {
            evaluate(&matrix.criteria, recorded, mode, &matrix.policy())
        })?;

        match outcome {
            Some(outcome) => info!(
                client_id = id.0,
                score_x = outcome.score_x,
                score_y = outcome.score_y,
                quadrant = %outcome.quadrant,
                "client classified"
            ),
            None => debug!(client_id = id.0, "client has no matrix; scores stored unclassified"),
        }
        Ok(())
    }

    fn ensure_linkable(&self, actor: &Actor, matrix_id: MatrixId) -> Result<(), ClientServiceError> {
        let detail = self
            .matrices
            .fetch_matrix(matrix_id)?
            .ok_or(ClientServiceError::MatrixNotFound(matrix_id))?;
        if !actor.owns(detail.matrix.organization_id) {
            return Err(ClientServiceError::MatrixNotFound(matrix_id));
        }
        if detail.matrix.is_soft_deleted() {
            return Err(ClientServiceError::Validation(format!(
                "matrix {matrix_id} is scheduled for deletion"
            )));
        }
        Ok(())
    }

    fn load_for_write(&self, actor: &Actor, id: ClientId) -> Result<ClientDetail, ClientServiceError> {
        let detail = self.reload(id)?;
        if !actor.owns(detail.client.organization_id) {
            return Err(ClientServiceError::Forbidden(
                "client belongs to a different organization".to_string(),
            ));
        }
        Ok(detail)
    }

    fn reload(&self, id: ClientId) -> Result<ClientDetail, ClientServiceError> {
        self.clients
            .fetch_client(id)?
            .ok_or(ClientServiceError::NotFound(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientServiceError {
    #[error("client {0} not found")]
    NotFound(ClientId),
    #[error("matrix {0} not found")]
    MatrixNotFound(MatrixId),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
