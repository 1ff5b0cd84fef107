use std::fmt;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{OrganizationId, UserId};
use crate::scoring::{Axis, Criterion, CriterionId, QuadrantPolicy, QuadrantRule};

pub const DEFAULT_AXIS_X_NAME: &str = "Axis X";
pub const DEFAULT_AXIS_Y_NAME: &str = "Axis Y";

/// Identifier wrapper for prioritization matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixId(pub i64);

impl fmt::Display for MatrixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matrix header row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub id: MatrixId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: String,
    pub axis_x_name: Option<String>,
    pub axis_y_name: Option<String>,
    pub is_active: bool,
    pub template_key: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Matrix {
    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn axis_x_label(&self) -> &str {
        display_axis_name(self.axis_x_name.as_deref(), DEFAULT_AXIS_X_NAME)
    }

    pub fn axis_y_label(&self) -> &str {
        display_axis_name(self.axis_y_name.as_deref(), DEFAULT_AXIS_Y_NAME)
    }
}

pub(crate) fn display_axis_name<'a>(stored: Option<&'a str>, fallback: &'a str) -> &'a str {
    match stored {
        Some(name) if !name.trim().is_empty() => name,
        _ => fallback,
    }
}

/// A matrix with everything the scoring pipeline reads from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixDetail {
    pub matrix: Matrix,
    pub criteria: Vec<Criterion>,
    pub quadrant_rules: Vec<QuadrantRule>,
}

impl MatrixDetail {
    pub fn policy(&self) -> QuadrantPolicy {
        QuadrantPolicy::from_rules(self.quadrant_rules.clone())
    }

    pub fn criterion(&self, id: CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| criterion.id == id)
    }

    pub fn criterion_named(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| criterion.name == name)
    }
}

/// Listing row for the organization's matrix overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixSummary {
    pub id: MatrixId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub criteria_count: usize,
    pub axis_x_name: String,
    pub axis_y_name: String,
}

fn default_weight() -> f64 {
    1.0
}

fn default_max_value() -> f64 {
    10.0
}

fn default_axis() -> String {
    Axis::X.label().to_string()
}

/// Status option as submitted by a client application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDraft {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub sort_order: i32,
}

/// Criterion as submitted for creation or edit; `id` is present only for in-place edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDraft {
    #[serde(default)]
    pub id: Option<CriterionId>,
    #[serde(default = "default_axis")]
    pub axis: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub statuses: Vec<StatusDraft>,
}

/// Request payload for creating a matrix with its initial criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub criteria: Vec<CriterionDraft>,
}

/// Partial matrix update. Criteria with an id are updated in place, the rest are inserted;
/// criteria absent from the edit are left untouched. `quadrant_rules` replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: Vec<CriterionDraft>,
    #[serde(default)]
    pub quadrant_rules: Option<Vec<QuadrantRule>>,
}

/// Display names for both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisNames {
    #[serde(default)]
    pub axis_x_name: String,
    #[serde(default)]
    pub axis_y_name: String,
}

/// Validated status ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatus {
    pub label: String,
    pub weight: f64,
    pub sort_order: i32,
}

/// Validated criterion ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCriterion {
    pub axis: Axis,
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub sort_order: i32,
    pub statuses: Vec<NewStatus>,
}

impl NewCriterion {
    /// Sanitizes a submitted criterion; `None` when the name is blank.
    pub fn from_draft(draft: &CriterionDraft) -> Option<Self> {
        let name = draft.name.trim();
        if name.is_empty() {
            return None;
        }

        let statuses = draft
            .statuses
            .iter()
            .filter_map(|status| {
                let label = status.label.trim();
                (!label.is_empty()).then(|| NewStatus {
                    label: label.to_string(),
                    weight: status.weight,
                    sort_order: status.sort_order,
                })
            })
            .collect();

        Some(Self {
            axis: Axis::coerce_scored(&draft.axis),
            name: name.to_string(),
            description: draft.description.trim().to_string(),
            weight: draft.weight,
            min_value: draft.min_value,
            max_value: draft.max_value,
            sort_order: draft.sort_order,
            statuses,
        })
    }
}

/// Validated matrix ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatrix {
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub name: String,
    pub description: String,
    pub template_key: Option<String>,
    pub criteria: Vec<NewCriterion>,
}

/// Criterion write within an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionUpsert {
    Update(CriterionId, NewCriterion),
    Insert(NewCriterion),
}

/// Validated edit handed to the repository; applied in one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub criteria: Vec<CriterionUpsert>,
    pub quadrant_rules: Option<Vec<QuadrantRule>>,
}

impl MatrixChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.criteria.is_empty()
            && self.quadrant_rules.is_none()
    }
}

/// Impact of a permanent delete, shown before the user confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteStats {
    pub matrix_name: String,
    pub criteria_count: usize,
    pub statuses_count: usize,
    pub clients_count: usize,
}

/// Rows affected by a cascade delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeCounts {
    pub deleted_client_scores: usize,
    pub deleted_statuses: usize,
    pub deleted_criteria: usize,
    pub deleted_quadrant_rules: usize,
    pub unlinked_clients: usize,
}

impl AddAssign for PurgeCounts {
    fn add_assign(&mut self, other: Self) {
        self.deleted_client_scores += other.deleted_client_scores;
        self.deleted_statuses += other.deleted_statuses;
        self.deleted_criteria += other.deleted_criteria;
        self.deleted_quadrant_rules += other.deleted_quadrant_rules;
        self.unlinked_clients += other.unlinked_clients;
    }
}

/// Result of a cascade attempt on a single matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeOutcome {
    Purged(PurgeCounts),
    /// Matrix is gone already, e.g. removed by a concurrent sweep.
    Missing,
    /// Matrix is live; nothing was touched.
    NotSoftDeleted,
}

/// Summary of one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub matrices_purged: usize,
    pub counts: PurgeCounts,
}
