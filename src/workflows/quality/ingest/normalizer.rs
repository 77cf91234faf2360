/// Normalize free-text identifiers from extracts: strip BOM, trim, and
/// collapse repeated whitespace. Code/name matching itself happens in the
/// code-set registry.
pub(crate) fn normalize_field(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) fn normalize_for_tests(raw: &str) -> String {
    normalize_field(raw)
}
