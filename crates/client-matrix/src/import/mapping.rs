use std::collections::BTreeMap;

use super::normalizer::normalize_label;

/// Client field a file column is imported into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    CompanyName,
    ContactPerson,
    Email,
    Phone,
    Description,
    Skip,
    /// Raw score of the criterion with this name.
    Criterion(String),
}

impl ColumnTarget {
    /// Accepts `criterion:<name>` and the legacy `criterion_<name>` spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(name) = trimmed
            .strip_prefix("criterion:")
            .or_else(|| trimmed.strip_prefix("criterion_"))
        {
            let name = name.trim();
            return (!name.is_empty()).then(|| ColumnTarget::Criterion(name.to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "company_name" => Some(ColumnTarget::CompanyName),
            "contact_person" => Some(ColumnTarget::ContactPerson),
            "email" => Some(ColumnTarget::Email),
            "phone" => Some(ColumnTarget::Phone),
            "description" => Some(ColumnTarget::Description),
            "skip" | "" => Some(ColumnTarget::Skip),
            _ => None,
        }
    }
}

/// File column → client field assignments, keyed by normalized header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMapping {
    columns: BTreeMap<String, ColumnTarget>,
}

impl ImportMapping {
    /// Builds a mapping from `(column, target)` pairs; the first unknown target is returned as error.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut columns = BTreeMap::new();
        for (column, target) in pairs {
            let parsed = ColumnTarget::parse(target)
                .ok_or_else(|| format!("unknown mapping target '{target}' for column '{column}'"))?;
            columns.insert(normalize_label(column), parsed);
        }
        Ok(Self { columns })
    }

    /// Guesses targets from header keywords; unmatched headers are skipped.
    pub fn suggest<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns = headers
            .into_iter()
            .map(|header| {
                let normalized = normalize_label(header);
                let target = suggested_target(&normalized);
                (normalized, target)
            })
            .collect();
        Self { columns }
    }

    pub fn target(&self, header: &str) -> &ColumnTarget {
        self.columns
            .get(&normalize_label(header))
            .unwrap_or(&ColumnTarget::Skip)
    }

    /// Distinct criterion names referenced by the mapping.
    pub fn criterion_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .columns
            .values()
            .filter_map(|target| match target {
                ColumnTarget::Criterion(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.columns
            .values()
            .all(|target| *target == ColumnTarget::Skip)
    }
}

fn suggested_target(normalized_header: &str) -> ColumnTarget {
    // Contact columns are often labelled "contact name", so they are tried before company.
    let rules: [(&[&str], ColumnTarget); 5] = [
        (
            &["contact", "контакт", "person", "representative"],
            ColumnTarget::ContactPerson,
        ),
        (
            &["company", "компания", "название", "name", "organization"],
            ColumnTarget::CompanyName,
        ),
        (&["email", "e-mail", "mail", "почта"], ColumnTarget::Email),
        (&["phone", "телефон", "tel", "mobile"], ColumnTarget::Phone),
        (
            &["description", "описание", "notes", "комментарий", "comment"],
            ColumnTarget::Description,
        ),
    ];

    rules
        .into_iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|keyword| normalized_header.contains(keyword))
        })
        .map(|(_, target)| target)
        .unwrap_or(ColumnTarget::Skip)
}
