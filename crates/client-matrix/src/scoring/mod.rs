//! Scoring and quadrant classification engine.
//!
//! Pure functions over already-loaded matrix configuration: a client's raw
//! per-criterion scores are aggregated into `(score_x, score_y)` and then mapped
//! to a quadrant label by the matrix's [`QuadrantPolicy`].

mod aggregate;
mod criteria;
mod quadrant;

pub use aggregate::{aggregate_scores, AxisScores, ScoringMode};
pub use criteria::{evaluation_order, Axis, Criterion, CriterionId, CriterionStatus, StatusId};
pub use quadrant::{
    classify_quadrant, QuadrantPolicy, QuadrantRule, RuleOperator, ARCHIVE, DEFAULT_THRESHOLD,
    FALLBACK_QUADRANT, FOCUS, GROW, MONITOR,
};

use serde::Serialize;

/// Result of one scoring pass: the aggregated point and its quadrant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub score_x: f64,
    pub score_y: f64,
    pub quadrant: String,
}

/// Runs aggregation then classification with a single policy.
pub fn evaluate(
    criteria: &[Criterion],
    scores: &[(CriterionId, f64)],
    mode: ScoringMode,
    policy: &QuadrantPolicy,
) -> ScoreOutcome {
    let AxisScores { score_x, score_y } = aggregate_scores(criteria, scores, mode);
    ScoreOutcome {
        score_x,
        score_y,
        quadrant: policy.classify(score_x, score_y),
    }
}
