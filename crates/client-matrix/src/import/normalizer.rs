/// Canonical form of a header or company name: invisible marks stripped, whitespace
/// collapsed, lowercased.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_and_collapses_whitespace() {
        assert_eq!(normalize_label("\u{feff}Company   Name "), "company name");
    }

    #[test]
    fn lowercases_cyrillic_headers() {
        assert_eq!(normalize_label("Компания"), "компания");
    }
}
