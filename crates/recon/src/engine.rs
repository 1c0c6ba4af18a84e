use std::collections::{BTreeMap, HashSet};

use mango_client::{Properties, RemoteStore};
use serde_json::Value;

use crate::cache::RunCaches;
use crate::config::ImportRules;
use crate::error::ReconError;
use crate::model::{
    ColumnSummary, Dataset, EntityLog, ImportMeta, ImportReport, ImportSummary, RelationLog, Row,
};
use crate::reconciler::Reconciler;
use crate::split::atoms;
use crate::type_rules::TypeRules;

/// Import `dataset` into `store` per `rules`. Returns the per-column entity
/// log, the relation log and a summary.
///
/// Runs sequentially and stops at the first failure; nothing is retried.
pub fn run<S: RemoteStore + ?Sized>(
    rules: &ImportRules,
    dataset: &Dataset,
    store: &S,
) -> Result<ImportReport, ReconError> {
    for column in rules.referenced_columns() {
        if !dataset.has_column(column) {
            return Err(ReconError::MissingColumn(column.to_string()));
        }
    }

    let type_rules = TypeRules::from_rules(rules);
    let mut caches = RunCaches::new();
    let mut rec = Reconciler::new(store, &type_rules, &mut caches);
    let mut summary = ImportSummary::default();

    let entities = merge_columns(rules, dataset, &mut rec, &mut summary)?;
    let relations = merge_relations(rules, dataset, &mut rec, &mut summary)?;
    summary.merges = rec.stats().clone();

    log::info!(
        "import done: {} entities created, {} matched; {} relations created, {} matched",
        summary.merges.entities_created,
        summary.merges.entities_matched,
        summary.merges.relations_created,
        summary.merges.relations_matched,
    );

    Ok(ImportReport {
        meta: ImportMeta {
            rules_name: rules.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            rows: dataset.len(),
            input_blake3: None,
        },
        summary,
        entities,
        relations,
    })
}

/// Overwrite `properties` onto the existing entity of `entity_type` keyed
/// by `key`. Fails with `EntityNotFound` when there is none.
pub fn update<S: RemoteStore + ?Sized>(
    rules: &ImportRules,
    store: &S,
    entity_type: &str,
    key: &str,
    properties: &Properties,
) -> Result<Value, ReconError> {
    let type_rules = TypeRules::from_rules(rules);
    let mut caches = RunCaches::new();
    Reconciler::new(store, &type_rules, &mut caches).update_entity(entity_type, key, properties)
}

// ---------------------------------------------------------------------------
// Column phase
// ---------------------------------------------------------------------------

fn merge_columns<S: RemoteStore + ?Sized>(
    rules: &ImportRules,
    dataset: &Dataset,
    rec: &mut Reconciler<'_, S>,
    summary: &mut ImportSummary,
) -> Result<EntityLog, ReconError> {
    let mut entity_log = EntityLog::new();

    for (column, display) in &rules.mapping {
        let candidates = distinct_candidates(rules, dataset, column);
        let mut ids = BTreeMap::new();
        for (value, extra) in &candidates {
            let merged = rec.merge_entity(display, value, &to_properties(extra))?;
            ids.insert(value.clone(), merged.id);
        }

        log::info!("merged {} {display} entities from column {column}", candidates.len());
        summary.columns.insert(
            column.clone(),
            ColumnSummary { entity_type: display.clone(), merged: ids.len() },
        );
        entity_log.insert(column.clone(), ids);
    }

    Ok(entity_log)
}

/// Distinct (atom, property cells) combinations of a column, in order of
/// first appearance.
fn distinct_candidates(
    rules: &ImportRules,
    dataset: &Dataset,
    column: &str,
) -> Vec<(String, BTreeMap<String, String>)> {
    let delimiter = rules.delimiter_for(column);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for row in dataset.rows() {
        let Some(value) = row.get(column) else {
            continue;
        };
        let extra = row_properties(rules, column, &row);
        for atom in atoms(value, delimiter) {
            let candidate = (atom, extra.clone());
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

// ---------------------------------------------------------------------------
// Relation phase
// ---------------------------------------------------------------------------

fn merge_relations<S: RemoteStore + ?Sized>(
    rules: &ImportRules,
    dataset: &Dataset,
    rec: &mut Reconciler<'_, S>,
    summary: &mut ImportSummary,
) -> Result<RelationLog, ReconError> {
    let mut relation_log = RelationLog::new();
    for rule in &rules.relations {
        summary.rows_skipped.insert(rule.name.clone(), 0);
    }

    for (index, row) in dataset.rows().enumerate() {
        for rule in &rules.relations {
            let (Some(value1), Some(value2)) = (row.get(&rule.entity1), row.get(&rule.entity2)) else {
                log::debug!("row {}: {} skipped, missing endpoint", index + 1, rule.name);
                *summary.rows_skipped.entry(rule.name.clone()).or_default() += 1;
                continue;
            };

            let display1 = display_for(rules, &rule.entity1)?;
            let display2 = display_for(rules, &rule.entity2)?;
            let extra1 = to_properties(&row_properties(rules, &rule.entity1, &row));
            let extra2 = to_properties(&row_properties(rules, &rule.entity2, &row));
            let atoms1 = atoms(value1, rules.delimiter_for(&rule.entity1));
            let atoms2 = atoms(value2, rules.delimiter_for(&rule.entity2));

            for atom1 in &atoms1 {
                for atom2 in &atoms2 {
                    let entity1 = rec.merge_entity(display1, atom1, &extra1)?.id;
                    let entity2 = rec.merge_entity(display2, atom2, &extra2)?.id;
                    let source_type = rec.collection_for(display1)?;
                    let target_type = rec.collection_for(display2)?;
                    let merged =
                        rec.merge_relation(&rule.name, &source_type, &target_type, &entity1, &entity2)?;

                    relation_log
                        .entry(rule.name.clone())
                        .or_default()
                        .entry(rule.entity1.clone())
                        .or_default()
                        .push(merged.id);
                }
            }
        }
    }

    for rule in &rules.relations {
        let linked = relation_log
            .get(&rule.name)
            .map_or(0, |by_column| by_column.values().map(Vec::len).sum());
        log::info!("linked {linked} {} relations", rule.name);
    }

    Ok(relation_log)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn display_for<'r>(rules: &'r ImportRules, column: &str) -> Result<&'r str, ReconError> {
    rules.mapping.get(column).map(String::as_str).ok_or_else(|| {
        ReconError::ConfigValidation(format!("column '{column}' has no entity type in [mapping]"))
    })
}

/// `{entity field -> cell}` for the non-empty property cells of `column`.
fn row_properties(rules: &ImportRules, column: &str, row: &Row<'_>) -> BTreeMap<String, String> {
    let Some(props) = rules.properties.get(column) else {
        return BTreeMap::new();
    };
    props
        .iter()
        .filter_map(|(source, field)| Some((field.clone(), row.get(source)?.to_string())))
        .collect()
}

fn to_properties(cells: &BTreeMap<String, String>) -> Properties {
    cells.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CallCounts, MemoryStore};

    fn rules(extra: &str) -> ImportRules {
        ImportRules::from_toml(&format!(
            r#"
[server]
url = "http://localhost/api"
user = "u"

[mapping]
fruit = "Fruit"
color = "Color"

[[relations]]
name = "hasColor"
entity1 = "fruit"
entity2 = "color"
{extra}
"#
        ))
        .unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_entity_type("fruit", "Fruit")
            .with_entity_type("color", "Color")
    }

    fn descriptions(store: &MemoryStore, collection: &str) -> Vec<String> {
        store
            .entities(collection)
            .iter()
            .map(|(_, fields)| fields["description"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn delimited_column_merges_each_trimmed_atom() {
        let rules = rules("[delimited_fields]\ncolor = \",\"\n");
        let data = Dataset::from_rows(&["fruit", "color"], &[vec!["", "red, blue"]]);
        let store = store();

        let report = run(&rules, &data, &store).unwrap();

        assert_eq!(descriptions(&store, "color"), vec!["red", "blue"]);
        assert_eq!(report.summary.columns["color"].merged, 2);
        assert_eq!(report.entities["color"].len(), 2);
        assert!(report.entities["color"].contains_key("red"));
        assert!(report.entities["color"].contains_key("blue"));
    }

    #[test]
    fn undelimited_value_is_one_entity() {
        let rules = rules("");
        let data = Dataset::from_rows(&["fruit", "color"], &[vec!["", "red, blue"]]);
        let store = store();

        run(&rules, &data, &store).unwrap();
        assert_eq!(descriptions(&store, "color"), vec!["red, blue"]);
    }

    #[test]
    fn missing_endpoint_skips_row_without_relation_calls() {
        let rules = rules("");
        let data = Dataset::from_rows(&["fruit", "color"], &[vec!["apple", ""], vec!["", "red"]]);
        let store = store();

        let report = run(&rules, &data, &store).unwrap();

        let calls = store.calls();
        assert_eq!(calls.relation_type_fetches, 0);
        assert_eq!(calls.relation_fetches, 0);
        assert_eq!(calls.relation_creates, 0);
        assert_eq!(report.summary.rows_skipped["hasColor"], 2);
        assert!(report.relations.is_empty());
    }

    #[test]
    fn fruit_and_colors_end_to_end() {
        let rules = rules("[delimited_fields]\ncolor = \",\"\n");
        let data = Dataset::from_rows(&["fruit", "color"], &[vec!["apple", "red, green"]]);
        let store = store();

        let report = run(&rules, &data, &store).unwrap();

        assert_eq!(descriptions(&store, "fruit"), vec!["apple"]);
        assert_eq!(descriptions(&store, "color"), vec!["red", "green"]);

        let apple = &report.entities["fruit"]["apple"];
        let red = &report.entities["color"]["red"];
        let green = &report.entities["color"]["green"];
        let triples = store.relation_triples();
        assert_eq!(triples.len(), 2);
        assert_eq!((&triples[0].0, &triples[0].1), (apple, red));
        assert_eq!((&triples[1].0, &triples[1].1), (apple, green));
        assert_eq!(triples[0].2, triples[1].2);

        assert_eq!(report.relations["hasColor"]["fruit"].len(), 2);
        assert_eq!(report.summary.merges.relation_types_created, 1);
        assert_eq!(report.summary.merges.relations_created, 2);
        // 3 created in the column phase, re-merged as matches while linking
        assert_eq!(report.summary.merges.entities_created, 3);
        assert_eq!(report.summary.merges.entities_matched, 4);
    }

    #[test]
    fn property_columns_are_merged_per_distinct_combination() {
        let rules = rules("[properties.fruit]\norigin = \"origin\"\n");
        let data = Dataset::from_rows(
            &["fruit", "color", "origin"],
            &[
                vec!["apple", "red", "Chile"],
                vec!["apple", "red", "Chile"],
                vec!["apple", "green", "Peru"],
            ],
        );
        let store = store();

        let report = run(&rules, &data, &store).unwrap();

        let apples = store.entities("fruit");
        assert_eq!(apples.len(), 2);
        assert_eq!(apples[0].1["origin"], "Chile");
        assert_eq!(apples[1].1["origin"], "Peru");
        // Both apples land under the one source value in the entity log
        assert_eq!(report.entities["fruit"].len(), 1);
        assert_eq!(report.summary.columns["fruit"].merged, 1);
        // Relation endpoints carry the same properties, so nothing new is created
        assert_eq!(report.summary.merges.entities_created, 4);
        assert_eq!(report.summary.merges.relations_created, 2);
        assert_eq!(report.summary.merges.relations_matched, 1);
    }

    #[test]
    fn missing_dataset_column_fails_before_any_call() {
        let rules = rules("");
        let data = Dataset::from_rows(&["fruit"], &[vec!["apple"]]);
        let store = store();

        let err = run(&rules, &data, &store).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn(ref c) if c == "color"));
        assert_eq!(store.calls(), CallCounts::default());
    }

    #[test]
    fn unknown_type_aborts_run() {
        let rules = rules("");
        let data = Dataset::from_rows(&["fruit", "color"], &[vec!["apple", "red"]]);
        let store = MemoryStore::new().with_entity_type("color", "Color");

        let err = run(&rules, &data, &store).unwrap_err();
        assert!(matches!(err, ReconError::UnknownEntityType(ref n) if n == "Fruit"));
    }

    #[test]
    fn update_goes_through_type_rules() {
        let rules = rules("");
        let store = store();
        let id = store.insert_entity("fruit", &[("description", "apple")]);

        let mut props = Properties::new();
        props.insert("origin".into(), Value::String("Peru".into()));
        update(&rules, &store, "Fruit", "apple", &props).unwrap();

        assert_eq!(store.entity("fruit", &id).unwrap()["origin"], "Peru");
    }
}
