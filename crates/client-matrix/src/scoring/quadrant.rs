use serde::{Deserialize, Deserializer, Serialize};

pub const FOCUS: &str = "focus";
pub const GROW: &str = "grow";
pub const MONITOR: &str = "monitor";
pub const ARCHIVE: &str = "archive";

/// Label returned when no configured rule matches.
pub const FALLBACK_QUADRANT: &str = ARCHIVE;

/// Threshold used for matrices without configured rules.
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// How a rule combines its x and y thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RuleOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl RuleOperator {
    pub const fn label(self) -> &'static str {
        match self {
            RuleOperator::And => "AND",
            RuleOperator::Or => "OR",
        }
    }

    /// `AND` in any case is conjunctive; every other value is disjunctive.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("and") {
            RuleOperator::And
        } else {
            RuleOperator::Or
        }
    }
}

impl<'de> Deserialize<'de> for RuleOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(RuleOperator::parse_lenient(&raw))
    }
}

/// Maps a region of the (x, y) plane to a quadrant label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantRule {
    pub quadrant: String,
    #[serde(default)]
    pub x_min: f64,
    #[serde(default)]
    pub y_min: f64,
    #[serde(default)]
    pub x_operator: RuleOperator,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    1
}

impl QuadrantRule {
    pub fn matches(&self, score_x: f64, score_y: f64) -> bool {
        let x_met = score_x >= self.x_min;
        let y_met = score_y >= self.y_min;
        match self.x_operator {
            RuleOperator::And => x_met && y_met,
            RuleOperator::Or => x_met || y_met,
        }
    }
}

/// Classification strategy of a matrix, chosen once when the matrix is loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuadrantPolicy {
    /// Configured rules, kept sorted by ascending priority; first match wins.
    RuleList { rules: Vec<QuadrantRule> },
    /// Both axes compared against one threshold with conjunctive semantics.
    FixedThreshold { threshold: f64 },
}

impl Default for QuadrantPolicy {
    fn default() -> Self {
        QuadrantPolicy::FixedThreshold {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl QuadrantPolicy {
    pub fn from_rules(mut rules: Vec<QuadrantRule>) -> Self {
        if rules.is_empty() {
            return QuadrantPolicy::default();
        }
        rules.sort_by_key(|rule| rule.priority);
        QuadrantPolicy::RuleList { rules }
    }

    pub fn classify(&self, score_x: f64, score_y: f64) -> String {
        match self {
            QuadrantPolicy::RuleList { rules } => rules
                .iter()
                .find(|rule| rule.matches(score_x, score_y))
                .map(|rule| rule.quadrant.clone())
                .unwrap_or_else(|| FALLBACK_QUADRANT.to_string()),
            QuadrantPolicy::FixedThreshold { threshold } => {
                let x_met = score_x >= *threshold;
                let y_met = score_y >= *threshold;
                let label = match (x_met, y_met) {
                    (true, true) => FOCUS,
                    (true, false) => GROW,
                    (false, true) => MONITOR,
                    (false, false) => ARCHIVE,
                };
                label.to_string()
            }
        }
    }
}

/// Classifies a point with either the given rules or, when there are none, the fixed default.
pub fn classify_quadrant(score_x: f64, score_y: f64, rules: Option<&[QuadrantRule]>) -> String {
    let policy = QuadrantPolicy::from_rules(rules.map(<[QuadrantRule]>::to_vec).unwrap_or_default());
    policy.classify(score_x, score_y)
}
