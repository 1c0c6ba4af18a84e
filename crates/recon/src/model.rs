use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Tabular input: named columns, string cells. An empty cell is a missing value.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        let mut index = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            // First occurrence wins for duplicated headers
            index.entry(name.clone()).or_insert(i);
        }
        Self { columns, index, rows: Vec::new() }
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows<C: AsRef<str>, V: AsRef<str>>(columns: &[C], rows: &[Vec<V>]) -> Self {
        let mut dataset = Self::new(columns.iter().map(|c| c.as_ref().to_string()).collect());
        for row in rows {
            dataset.push_row(row.iter().map(|v| v.as_ref().to_string()).collect());
        }
        dataset
    }

    /// Append a row. Short rows are padded with empty cells.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), String::new());
        }
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { index: &self.index, cells })
    }
}

/// Borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: &'a HashMap<String, usize>,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell value for `column`; `None` when the column is absent or the cell
    /// is empty or whitespace-only.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let i = *self.index.get(column)?;
        let value = self.cells.get(i)?.as_str();
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

// ---------------------------------------------------------------------------
// Merge outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// A matching record already existed (remotely or in a run cache).
    Matched,
    /// No match; a new record was written.
    Created,
}

/// Result of a find-or-create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub id: String,
    pub status: MergeStatus,
}

impl Merged {
    pub fn matched(id: impl Into<String>) -> Self {
        Self { id: id.into(), status: MergeStatus::Matched }
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self { id: id.into(), status: MergeStatus::Created }
    }

    pub fn is_created(&self) -> bool {
        self.status == MergeStatus::Created
    }
}

/// Counters kept by a reconciler over one run. Every merge call counts once,
/// so entities re-merged while linking relations show up as matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub entities_created: usize,
    pub entities_matched: usize,
    pub relation_types_created: usize,
    pub relations_created: usize,
    pub relations_matched: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Column name -> { source value -> entity id }.
pub type EntityLog = BTreeMap<String, BTreeMap<String, String>>;

/// Relation name -> { source column -> relation ids in row order }.
pub type RelationLog = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub entity_type: String,
    /// Distinct source values recorded in the entity log for this column
    pub merged: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub columns: BTreeMap<String, ColumnSummary>,
    #[serde(flatten)]
    pub merges: MergeStats,
    /// Relation rule name -> rows skipped for a missing endpoint.
    pub rows_skipped: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_name: Option<String>,
    pub engine_version: String,
    pub run_at: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_blake3: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub meta: ImportMeta,
    pub summary: ImportSummary,
    pub entities: EntityLog,
    pub relations: RelationLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_get_treats_blank_as_missing() {
        let ds = Dataset::from_rows(&["a", "b", "c"], &[vec!["x", "  ", ""]]);
        let row = ds.rows().next().unwrap();
        assert_eq!(row.get("a"), Some("x"));
        assert_eq!(row.get("b"), None);
        assert_eq!(row.get("c"), None);
        assert_eq!(row.get("nope"), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = Dataset::from_rows(&["a", "b"], &[vec!["x"]]);
        let row = ds.rows().next().unwrap();
        assert_eq!(row.get("a"), Some("x"));
        assert_eq!(row.get("b"), None);
    }

    #[test]
    fn duplicate_header_first_wins() {
        let ds = Dataset::from_rows(&["a", "a"], &[vec!["first", "second"]]);
        assert_eq!(ds.rows().next().unwrap().get("a"), Some("first"));
    }

    #[test]
    fn summary_flattens_merge_counters() {
        let summary = ImportSummary {
            merges: MergeStats { relations_created: 2, ..Default::default() },
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["relations_created"], 2);
        assert!(json.get("merges").is_none());
    }
}
