use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::criteria::{Axis, Criterion, CriterionId};

/// Selects how a raw per-criterion score becomes an axis contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Raw values sit inside each criterion's `min_value..=max_value` range and are
    /// normalized, weighted, averaged and scaled to 0..10.
    #[default]
    ValueRange,
    /// Raw values are chosen status weights, combined as a weighted mean over the
    /// scored criteria of the axis.
    StatusWeight,
}

/// Aggregated position of a client in the prioritization space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisScores {
    pub score_x: f64,
    pub score_y: f64,
}

struct ScoredCriterion<'a> {
    criterion: &'a Criterion,
    raw: f64,
}

impl ScoringMode {
    fn axis_score(self, scored: &[ScoredCriterion<'_>]) -> f64 {
        if scored.is_empty() {
            return 0.0;
        }

        match self {
            ScoringMode::ValueRange => {
                let total: f64 = scored
                    .iter()
                    .map(|entry| value_range_contribution(entry.criterion, entry.raw))
                    .sum();
                total / scored.len() as f64 * 10.0
            }
            ScoringMode::StatusWeight => {
                let total_weight: f64 = scored.iter().map(|entry| entry.criterion.weight).sum();
                if total_weight == 0.0 {
                    return 0.0;
                }
                scored
                    .iter()
                    .map(|entry| entry.raw * entry.criterion.weight / total_weight)
                    .sum()
            }
        }
    }
}

fn value_range_contribution(criterion: &Criterion, raw: f64) -> f64 {
    if !criterion.has_range() {
        return 0.0;
    }
    (raw - criterion.min_value) / (criterion.max_value - criterion.min_value) * criterion.weight
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes `(score_x, score_y)` for one client.
///
/// Only criteria with a recorded score take part; a later score for the same criterion
/// replaces an earlier one. Scores for criteria outside `criteria` and criteria on the
/// universal axis are ignored. An axis without scored criteria scores `0.0`.
pub fn aggregate_scores(
    criteria: &[Criterion],
    scores: &[(CriterionId, f64)],
    mode: ScoringMode,
) -> AxisScores {
    let recorded: BTreeMap<CriterionId, f64> = scores.iter().copied().collect();

    let mut x_axis = Vec::new();
    let mut y_axis = Vec::new();
    for criterion in criteria {
        let Some(raw) = recorded.get(&criterion.id).copied() else {
            continue;
        };
        let entry = ScoredCriterion { criterion, raw };
        match criterion.axis {
            Axis::X => x_axis.push(entry),
            Axis::Y => y_axis.push(entry),
            Axis::Universal => {}
        }
    }

    AxisScores {
        score_x: round2(mode.axis_score(&x_axis)),
        score_y: round2(mode.axis_score(&y_axis)),
    }
}
