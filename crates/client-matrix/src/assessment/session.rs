use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Actor;
use crate::clients::{NewClient, ScoreInput};
use crate::matrices::MatrixId;
use crate::repository::RepositoryError;
use crate::scoring::CriterionId;

/// Chat platform user the conversation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatUserId(pub i64);

impl fmt::Display for ChatUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-progress conversational assessment of a client that is not yet saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub actor: Actor,
    pub matrix_id: MatrixId,
    pub client: NewClient,
    /// Criteria to ask, in presentation order.
    pub questions: Vec<CriterionId>,
    pub position: usize,
    pub answers: Vec<ScoreInput>,
}

impl AssessmentSession {
    pub fn current_question(&self) -> Option<CriterionId> {
        self.questions.get(self.position).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.questions.len()
    }
}

/// Per-chat-user conversation state with expiry.
pub trait SessionStore: Send + Sync {
    /// Returns the session unless it is absent or expired at `now`.
    fn load_session(
        &self,
        chat_user: ChatUserId,
        now: DateTime<Utc>,
    ) -> Result<Option<AssessmentSession>, RepositoryError>;
    /// Replaces any existing session for the user.
    fn save_session(
        &self,
        chat_user: ChatUserId,
        session: &AssessmentSession,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    fn clear_session(&self, chat_user: ChatUserId) -> Result<(), RepositoryError>;
    /// Drops every session expired at `now`; returns how many were removed.
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
