use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{OrganizationId, UserId};
use crate::matrices::MatrixId;
use crate::scoring::{CriterionId, ScoringMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client as stored, including its last computed matrix position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub organization_id: OrganizationId,
    pub matrix_id: Option<MatrixId>,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub score_x: f64,
    pub score_y: f64,
    /// `None` until the client has been scored against a matrix.
    pub quadrant: Option<String>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Latest raw score of one criterion for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientScore {
    pub criterion_id: CriterionId,
    pub score: f64,
    pub comment: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDetail {
    pub client: Client,
    pub scores: Vec<ClientScore>,
}

/// Client profile as submitted on creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub matrix_id: Option<MatrixId>,
}

impl NewClient {
    pub(crate) fn trimmed(&self) -> Self {
        Self {
            company_name: self.company_name.trim().to_string(),
            contact_person: self.contact_person.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            description: self.description.trim().to_string(),
            matrix_id: self.matrix_id,
        }
    }
}

/// One submitted criterion score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub criterion_id: CriterionId,
    pub score: f64,
    #[serde(default)]
    pub comment: String,
}

/// Partial client update; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub matrix_id: Option<MatrixId>,
    /// When present the scoring cycle runs after the profile update.
    #[serde(default)]
    pub scores: Option<Vec<ScoreInput>>,
    #[serde(default)]
    pub mode: ScoringMode,
}

impl ClientUpdate {
    pub(crate) fn touches_profile(&self) -> bool {
        self.company_name.is_some()
            || self.contact_person.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.description.is_some()
            || self.matrix_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientFilter {
    #[serde(default)]
    pub quadrant: Option<String>,
    #[serde(default)]
    pub matrix_id: Option<MatrixId>,
    #[serde(default)]
    pub include_inactive: bool,
}
