//! Multi-valued cell expansion.

use std::collections::HashSet;

/// Split `value` on `delimiter` into trimmed, non-empty atoms, deduplicated
/// in order of first appearance.
pub fn split_field(value: &str, delimiter: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|atom| !atom.is_empty())
        .filter(|atom| seen.insert(*atom))
        .map(String::from)
        .collect()
}

/// Atoms of a cell: split when the column is delimited, the whole value otherwise.
pub fn atoms(value: &str, delimiter: Option<&str>) -> Vec<String> {
    match delimiter {
        Some(d) => split_field(value, d),
        None => vec![value.to_string()],
    }
}
