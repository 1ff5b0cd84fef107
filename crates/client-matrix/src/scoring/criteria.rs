use serde::{Deserialize, Serialize};

/// Identifier wrapper for a matrix criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(pub i64);

/// Identifier wrapper for a discrete criterion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub i64);

/// Scoring dimension a criterion contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    /// Matrix-wide pseudo-axis used by custom matrices; it never feeds `score_x` or `score_y`.
    Universal,
}

impl Axis {
    pub const fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Universal => "universal",
        }
    }

    /// Axis for a user-supplied criterion: anything other than `y` lands on `x`.
    pub fn coerce_scored(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "y" => Axis::Y,
            _ => Axis::X,
        }
    }

    /// Axis as persisted, including the universal pseudo-axis.
    pub fn from_stored(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "y" => Axis::Y,
            "universal" => Axis::Universal,
            _ => Axis::X,
        }
    }
}

/// Discrete answer attached to a criterion. Its weight is used as the raw score directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStatus {
    pub id: StatusId,
    pub label: String,
    pub weight: f64,
    pub sort_order: i32,
}

/// A single weighted, bounded scoring dimension of a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub axis: Axis,
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub sort_order: i32,
    #[serde(default)]
    pub statuses: Vec<CriterionStatus>,
}

impl Criterion {
    /// `false` when `min_value == max_value`; such a criterion contributes nothing in value-range mode.
    pub fn has_range(&self) -> bool {
        self.max_value != self.min_value
    }

    pub fn status(&self, index: usize) -> Option<&CriterionStatus> {
        self.statuses.get(index)
    }
}

/// Orders criteria the way they are presented and evaluated: by axis, then sort order.
pub fn evaluation_order(criteria: &mut [Criterion]) {
    criteria.sort_by(|left, right| {
        left.axis
            .cmp(&right.axis)
            .then(left.sort_order.cmp(&right.sort_order))
            .then(left.id.cmp(&right.id))
    });
    for criterion in criteria.iter_mut() {
        criterion.statuses.sort_by_key(|status| status.sort_order);
    }
}
