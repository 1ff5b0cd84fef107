use serde::Serialize;

use crate::scoring::Axis;

use super::domain::NewCriterion;

/// Criterion preset carried by a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateCriterion {
    pub axis: Axis,
    pub name: &'static str,
    pub hint: &'static str,
    pub weight: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub sort_order: i32,
}

impl TemplateCriterion {
    pub(crate) fn to_new_criterion(&self) -> NewCriterion {
        NewCriterion {
            axis: self.axis,
            name: self.name.to_string(),
            description: self.hint.to_string(),
            weight: self.weight,
            min_value: self.min_value,
            max_value: self.max_value,
            sort_order: self.sort_order,
            statuses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub criteria: Vec<TemplateCriterion>,
}

/// Built-in templates offered when creating a matrix.
#[derive(Debug)]
pub struct TemplateCatalog {
    templates: Vec<MatrixTemplate>,
}

impl TemplateCatalog {
    pub fn standard() -> Self {
        Self {
            templates: standard_templates(),
        }
    }

    pub fn templates(&self) -> &[MatrixTemplate] {
        &self.templates
    }

    pub fn find(&self, key: &str) -> Option<&MatrixTemplate> {
        self.templates.iter().find(|template| template.key == key)
    }
}

/// The single criterion a custom matrix starts with.
pub(crate) fn custom_matrix_seed() -> NewCriterion {
    NewCriterion {
        axis: Axis::Universal,
        name: "Need maturity".to_string(),
        description: "How clearly the client recognises the need for a solution".to_string(),
        weight: 1.0,
        min_value: 0.0,
        max_value: 10.0,
        sort_order: 1,
        statuses: Vec::new(),
    }
}

fn criterion(
    axis: Axis,
    name: &'static str,
    hint: &'static str,
    weight: f64,
    sort_order: i32,
) -> TemplateCriterion {
    TemplateCriterion {
        axis,
        name,
        hint,
        weight,
        min_value: 0.0,
        max_value: 10.0,
        sort_order,
    }
}

fn standard_templates() -> Vec<MatrixTemplate> {
    vec![
        MatrixTemplate {
            key: "strategic_fit",
            name: "Strategic impact vs need maturity",
            description: "Rank accounts by how much they move the business and how ready they are to buy.",
            criteria: vec![
                criterion(Axis::X, "Revenue potential", "Expected annual contract value relative to the portfolio.", 2.0, 1),
                criterion(Axis::X, "Strategic reference value", "Brand or industry leverage the logo brings.", 1.0, 2),
                criterion(Axis::X, "Expansion headroom", "Room for additional products, seats or regions.", 1.0, 3),
                criterion(Axis::Y, "Pain acknowledged", "The client has named the problem in their own words.", 2.0, 1),
                criterion(Axis::Y, "Budget allocated", "Funding for a solution is approved or earmarked.", 1.5, 2),
                criterion(Axis::Y, "Decision timeline", "A decision date exists within the next two quarters.", 1.0, 3),
            ],
        },
        MatrixTemplate {
            key: "account_growth",
            name: "Account growth",
            description: "Separate accounts worth investing in from accounts to keep on maintenance.",
            criteria: vec![
                criterion(Axis::X, "Current revenue", "Share of revenue the account already produces.", 1.0, 1),
                criterion(Axis::X, "Margin", "Profitability after delivery and support cost.", 1.0, 2),
                criterion(Axis::Y, "Relationship strength", "Executive sponsor and multi-threaded contacts.", 1.0, 1),
                criterion(Axis::Y, "Product adoption", "Active usage across licensed features.", 1.0, 2),
            ],
        },
    ]
}
