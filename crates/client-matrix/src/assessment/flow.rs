use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::access::Actor;
use crate::clients::{ClientDetail, ClientRepository, ClientService, ClientServiceError, NewClient, ScoreInput};
use crate::matrices::{MatrixDetail, MatrixId, MatrixRepository, MatrixService, MatrixServiceError};
use crate::repository::RepositoryError;
use crate::scoring::{Axis, Criterion, CriterionId, ScoringMode};

use super::session::{AssessmentSession, ChatUserId, SessionStore};

pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOption {
    pub index: usize,
    pub label: String,
    pub weight: f64,
}

/// One question of the assessment: pick a status for a criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentPrompt {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub description: String,
    pub axis: Axis,
    pub options: Vec<StatusOption>,
    /// 1-based position of this question.
    pub position: usize,
    pub total: usize,
}

impl AssessmentPrompt {
    fn for_criterion(criterion: &Criterion, position: usize, total: usize) -> Self {
        Self {
            criterion_id: criterion.id,
            criterion_name: criterion.name.clone(),
            description: criterion.description.clone(),
            axis: criterion.axis,
            options: criterion
                .statuses
                .iter()
                .enumerate()
                .map(|(index, status)| StatusOption {
                    index,
                    label: status.label.clone(),
                    weight: status.weight,
                })
                .collect(),
            position: position + 1,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AssessmentStep {
    Prompt(AssessmentPrompt),
    Completed { client: ClientDetail },
}

/// Walks a chat user through the status questions of a matrix, then saves the scored client.
pub struct AssessmentFlow<S, C, M> {
    sessions: Arc<S>,
    matrices: Arc<MatrixService<M>>,
    clients: Arc<ClientService<C, M>>,
    ttl: Duration,
}

impl<S, C, M> AssessmentFlow<S, C, M>
where
    S: SessionStore + 'static,
    C: ClientRepository + 'static,
    M: MatrixRepository + 'static,
{
    pub fn new(
        sessions: Arc<S>,
        matrices: Arc<MatrixService<M>>,
        clients: Arc<ClientService<C, M>>,
    ) -> Self {
        Self {
            sessions,
            matrices,
            clients,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn start(
        &self,
        actor: &Actor,
        chat_user: ChatUserId,
        client: NewClient,
        matrix_id: MatrixId,
        now: DateTime<Utc>,
    ) -> Result<AssessmentPrompt, AssessmentError> {
        let client = client.trimmed();
        if client.company_name.is_empty() {
            return Err(AssessmentError::Validation(
                "company_name is required".to_string(),
            ));
        }

        let detail = self.matrices.get(actor, matrix_id)?;
        if detail.matrix.is_soft_deleted() {
            return Err(AssessmentError::Validation(format!(
                "matrix {matrix_id} is scheduled for deletion"
            )));
        }

        let questions: Vec<CriterionId> = detail
            .criteria
            .iter()
            .filter(|criterion| !criterion.statuses.is_empty())
            .map(|criterion| criterion.id)
            .collect();
        if questions.is_empty() {
            return Err(AssessmentError::Validation(format!(
                "matrix {matrix_id} has no criteria with statuses to assess"
            )));
        }

        let session = AssessmentSession {
            actor: *actor,
            matrix_id,
            client: NewClient {
                matrix_id: Some(matrix_id),
                ..client
            },
            questions,
            position: 0,
            answers: Vec::new(),
        };
        let prompt = prompt_at(&detail, &session)?;
        self.sessions
            .save_session(chat_user, &session, now + self.ttl)?;
        info!(chat_user = chat_user.0, matrix_id = matrix_id.0, total = prompt.total, "assessment started");
        Ok(prompt)
    }

    /// Records the chosen status for the current question and advances the conversation.
    pub fn choose(
        &self,
        actor: &Actor,
        chat_user: ChatUserId,
        criterion_id: CriterionId,
        status_index: usize,
        now: DateTime<Utc>,
    ) -> Result<AssessmentStep, AssessmentError> {
        let mut session = self.session_for(actor, chat_user, now)?;

        let current = session
            .current_question()
            .ok_or(AssessmentError::SessionExpired(chat_user))?;
        if current != criterion_id {
            return Err(AssessmentError::Validation(format!(
                "criterion {} is not the current question",
                criterion_id.0
            )));
        }

        let detail = self.matrices.get(&session.actor, session.matrix_id)?;
        let criterion = detail.criterion(current).ok_or_else(|| {
            AssessmentError::Validation(format!("criterion {} no longer exists", current.0))
        })?;
        let status = criterion.status(status_index).ok_or_else(|| {
            AssessmentError::Validation(format!(
                "status {status_index} is not an option for criterion {}",
                current.0
            ))
        })?;

        session.answers.push(ScoreInput {
            criterion_id: current,
            score: status.weight,
            comment: status.label.clone(),
        });
        session.position += 1;

        if !session.is_complete() {
            let prompt = prompt_at(&detail, &session)?;
            self.sessions
                .save_session(chat_user, &session, now + self.ttl)?;
            return Ok(AssessmentStep::Prompt(prompt));
        }

        let client = self.clients.create_client(
            &session.actor,
            session.client.clone(),
            session.answers.clone(),
            ScoringMode::StatusWeight,
        )?;
        self.sessions.clear_session(chat_user)?;
        info!(chat_user = chat_user.0, client_id = client.client.id.0, "assessment completed");
        Ok(AssessmentStep::Completed { client })
    }

    /// Saves the client without any assessment and ends the conversation.
    pub fn cancel(
        &self,
        actor: &Actor,
        chat_user: ChatUserId,
        now: DateTime<Utc>,
    ) -> Result<ClientDetail, AssessmentError> {
        let session = self.session_for(actor, chat_user, now)?;

        let client = NewClient {
            matrix_id: None,
            ..session.client
        };
        let saved = self
            .clients
            .create_client(&session.actor, client, Vec::new(), ScoringMode::StatusWeight)?;
        self.sessions.clear_session(chat_user)?;
        info!(chat_user = chat_user.0, client_id = saved.client.id.0, "assessment cancelled");
        Ok(saved)
    }

    /// A session started by another organization is reported as absent.
    fn session_for(
        &self,
        actor: &Actor,
        chat_user: ChatUserId,
        now: DateTime<Utc>,
    ) -> Result<AssessmentSession, AssessmentError> {
        match self.sessions.load_session(chat_user, now)? {
            Some(session) if session.actor.organization_id == actor.organization_id => Ok(session),
            Some(session) => {
                warn!(
                    chat_user = chat_user.0,
                    caller_org = actor.organization_id.0,
                    session_org = session.actor.organization_id.0,
                    "assessment session requested by another organization"
                );
                Err(AssessmentError::SessionExpired(chat_user))
            }
            None => Err(AssessmentError::SessionExpired(chat_user)),
        }
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, AssessmentError> {
        Ok(self.sessions.purge_expired_sessions(now)?)
    }
}

fn prompt_at(
    detail: &MatrixDetail,
    session: &AssessmentSession,
) -> Result<AssessmentPrompt, AssessmentError> {
    let id = session.current_question().ok_or_else(|| {
        AssessmentError::Validation("assessment has no remaining questions".to_string())
    })?;
    let criterion = detail.criterion(id).ok_or_else(|| {
        AssessmentError::Validation(format!("criterion {} no longer exists", id.0))
    })?;
    Ok(AssessmentPrompt::for_criterion(
        criterion,
        session.position,
        session.questions.len(),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("assessment session for chat user {0} is missing or expired")]
    SessionExpired(ChatUserId),
    #[error("invalid answer: {0}")]
    Validation(String),
    #[error(transparent)]
    Matrix(#[from] MatrixServiceError),
    #[error(transparent)]
    Client(#[from] ClientServiceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
