use std::io::Read;

use crate::clients::NewClient;

use super::mapping::{ColumnTarget, ImportMapping};

/// One data row resolved against the mapping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportRow {
    pub(crate) client: NewClient,
    /// `(criterion name, raw score)`; non-numeric cells are already dropped.
    pub(crate) scores: Vec<(String, f64)>,
}

pub(crate) fn parse_rows<R: Read>(
    reader: R,
    mapping: &ImportMapping,
) -> Result<Vec<ImportRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let targets: Vec<ColumnTarget> = csv_reader
        .headers()?
        .iter()
        .map(|header| mapping.target(header).clone())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row = ImportRow {
            client: NewClient::default(),
            scores: Vec::new(),
        };

        for (target, value) in targets.iter().zip(record.iter()) {
            if value.is_empty() {
                continue;
            }
            match target {
                ColumnTarget::CompanyName => row.client.company_name = value.to_string(),
                ColumnTarget::ContactPerson => row.client.contact_person = value.to_string(),
                ColumnTarget::Email => row.client.email = value.to_string(),
                ColumnTarget::Phone => row.client.phone = value.to_string(),
                ColumnTarget::Description => row.client.description = value.to_string(),
                ColumnTarget::Criterion(name) => {
                    if let Some(score) = parse_score(value) {
                        row.scores.push((name.clone(), score));
                    }
                }
                ColumnTarget::Skip => {}
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Header row of a CSV document, as the reader sees it.
pub(crate) fn read_headers<R: Read>(reader: R) -> Result<Vec<String>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    Ok(csv_reader.headers()?.iter().map(str::to_string).collect())
}

fn parse_score(value: &str) -> Option<f64> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}
