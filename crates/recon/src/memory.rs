//! In-process [`RemoteStore`] for offline runs and tests.
//!
//! Matches selectors the way the HTTP store does (every field compared by
//! its string form) and counts every call, so callers can check how many
//! round-trips an import would cost.

use std::cell::RefCell;
use std::collections::BTreeMap;

use mango_client::{
    selector_value, EntityRecord, EntityTypeRecord, NewRelation, NewRelationType, Properties,
    RelationRecord, RelationTypeRecord, RemoteStore, StoreError, TypeRef,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ImportRules;
use crate::relation_type::TYPES_COLLECTION;
use crate::type_rules::TypeRules;

/// Per-operation call counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallCounts {
    pub entity_type_fetches: usize,
    pub entity_queries: usize,
    pub entity_creates: usize,
    pub entity_updates: usize,
    pub relation_type_fetches: usize,
    pub relation_fetches: usize,
    pub relation_type_creates: usize,
    pub relation_creates: usize,
}

#[derive(Default)]
struct State {
    /// Collection -> records in insertion order
    entities: BTreeMap<String, Vec<(String, Properties)>>,
    relation_types: Vec<RelationTypeRecord>,
    relations: Vec<Value>,
    next_id: u64,
    calls: CallCounts,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn insert_entity(&mut self, collection: &str, properties: Properties) -> String {
        let id = self.next_id();
        self.entities
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), properties));
        id
    }

    fn find(&self, collection: &str, selector: &Properties) -> Option<&(String, Properties)> {
        self.entities.get(collection)?.iter().find(|(_, fields)| {
            selector.iter().all(|(field, wanted)| {
                fields.get(field).map(selector_value) == Some(selector_value(wanted))
            })
        })
    }

    fn type_name(&self, type_id: &str) -> Option<String> {
        let (_, fields) = self.entities.get(TYPES_COLLECTION)?.iter().find(|(id, _)| id == type_id)?;
        fields.get("name").and_then(Value::as_str).map(String::from)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one active entity type per mapped display name
    /// (collection = lowercased display name) and every reference entity the
    /// type rules point at.
    pub fn for_rules(rules: &ImportRules, type_rules: &TypeRules) -> Self {
        let mut store = Self::new();
        let mut seeded: Vec<String> = Vec::new();
        for display in rules.mapping.values() {
            let collection = display.to_lowercase();
            if !seeded.contains(&collection) {
                store = store.with_entity_type(&collection, display);
                seeded.push(collection);
            }
        }
        for collection in &seeded {
            for rule in type_rules.defaults_for(collection) {
                let lookup = &rule.reference;
                let mut selector = Properties::new();
                selector.insert(lookup.field.clone(), Value::String(lookup.value.clone()));
                let mut state = store.state.borrow_mut();
                if state.find(&lookup.collection, &selector).is_none() {
                    state.insert_entity(&lookup.collection, selector);
                }
            }
        }
        store
    }

    /// Add an active entity type record to the `types` collection.
    pub fn with_entity_type(self, name: &str, display_name: &str) -> Self {
        let mut properties = Properties::new();
        properties.insert("name".into(), json!(name));
        properties.insert("displayName".into(), json!(display_name));
        properties.insert("active".into(), json!(true));
        self.state.borrow_mut().insert_entity(TYPES_COLLECTION, properties);
        self
    }

    /// Id of the `types` record named `name`.
    pub fn type_id(&self, name: &str) -> Option<String> {
        let mut selector = Properties::new();
        selector.insert("name".into(), json!(name));
        self.state.borrow().find(TYPES_COLLECTION, &selector).map(|(id, _)| id.clone())
    }

    /// Seed an entity without counting a call.
    pub fn insert_entity(&self, collection: &str, fields: &[(&str, &str)]) -> String {
        let properties = fields.iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
        self.state.borrow_mut().insert_entity(collection, properties)
    }

    pub fn entity(&self, collection: &str, id: &str) -> Option<Properties> {
        let state = self.state.borrow();
        let records = state.entities.get(collection)?;
        records.iter().find(|(rid, _)| rid == id).map(|(_, fields)| fields.clone())
    }

    /// All records of a collection, in insertion order.
    pub fn entities(&self, collection: &str) -> Vec<(String, Properties)> {
        self.state.borrow().entities.get(collection).cloned().unwrap_or_default()
    }

    /// Seed a relation type between two type names without counting a call.
    pub fn insert_relation_type(&self, name: &str, source: &str, target: &str) -> String {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.relation_types.push(RelationTypeRecord {
            id: id.clone(),
            name: name.to_string(),
            source: TypeRef { name: source.to_string() },
            target: TypeRef { name: target.to_string() },
        });
        id
    }

    pub fn relation_type(&self, id: &str) -> Option<RelationTypeRecord> {
        self.state.borrow().relation_types.iter().find(|r| r.id == id).cloned()
    }

    /// Seed a well-formed relation without counting a call.
    pub fn insert_relation(&self, entity1: &str, entity2: &str, relation_type: &str) -> String {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.relations.push(json!({
            "_id": id,
            "entity1": entity1,
            "entity2": entity2,
            "relationType": relation_type,
        }));
        id
    }

    /// Seed an arbitrary relation record, e.g. one with populated endpoints.
    pub fn insert_raw_relation(&self, record: Value) {
        self.state.borrow_mut().relations.push(record);
    }

    /// `(entity1, entity2, relationType)` of every well-formed relation.
    pub fn relation_triples(&self) -> Vec<(String, String, String)> {
        self.state
            .borrow()
            .relations
            .iter()
            .filter_map(|r| {
                Some((
                    r["entity1"].as_str()?.to_string(),
                    r["entity2"].as_str()?.to_string(),
                    r["relationType"].as_str()?.to_string(),
                ))
            })
            .collect()
    }

    pub fn calls(&self) -> CallCounts {
        self.state.borrow().calls.clone()
    }
}

impl RemoteStore for MemoryStore {
    fn active_entity_types(&self) -> Result<Vec<EntityTypeRecord>, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.entity_type_fetches += 1;
        let types = state.entities.get(TYPES_COLLECTION).map(Vec::as_slice).unwrap_or_default();
        Ok(types
            .iter()
            .filter(|(_, fields)| fields.get("active") == Some(&Value::Bool(true)))
            .filter_map(|(_, fields)| {
                Some(EntityTypeRecord {
                    name: fields.get("name")?.as_str()?.to_string(),
                    display_name: fields.get("displayName")?.as_str()?.to_string(),
                })
            })
            .collect())
    }

    fn query_entity(
        &self,
        collection: &str,
        selector: &Properties,
    ) -> Result<Option<EntityRecord>, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.entity_queries += 1;
        Ok(state.find(collection, selector).map(|(id, fields)| {
            let mut map: serde_json::Map<String, Value> =
                fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            map.insert("_id".into(), Value::String(id.clone()));
            EntityRecord { id: id.clone(), fields: map }
        }))
    }

    fn create_entity(&self, collection: &str, properties: &Properties) -> Result<String, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.entity_creates += 1;
        Ok(state.insert_entity(collection, properties.clone()))
    }

    fn update_entity(
        &self,
        collection: &str,
        id: &str,
        properties: &Properties,
    ) -> Result<Value, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.entity_updates += 1;
        let record = state
            .entities
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|(rid, _)| rid == id))
            .ok_or_else(|| StoreError::Rejected {
                status: 404,
                body: format!("no {collection} entity with id {id}"),
            })?;
        record.1.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(json!({ "ok": 1 }))
    }

    fn active_relation_types(&self) -> Result<Vec<RelationTypeRecord>, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.relation_type_fetches += 1;
        Ok(state.relation_types.clone())
    }

    fn relations(&self) -> Result<Vec<RelationRecord>, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.relation_fetches += 1;
        Ok(state
            .relations
            .iter()
            .filter_map(|r| serde_json::from_value(r.clone()).ok())
            .collect())
    }

    fn create_relation_type(&self, relation_type: &NewRelationType) -> Result<String, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.relation_type_creates += 1;
        let missing = |id: &str| StoreError::Rejected { status: 404, body: format!("no type with id {id}") };
        let source = state.type_name(&relation_type.source_type_id).ok_or_else(|| missing(&relation_type.source_type_id))?;
        let target = state.type_name(&relation_type.target_type_id).ok_or_else(|| missing(&relation_type.target_type_id))?;
        let id = state.next_id();
        state.relation_types.push(RelationTypeRecord {
            id: id.clone(),
            name: relation_type.name.clone(),
            source: TypeRef { name: source },
            target: TypeRef { name: target },
        });
        Ok(id)
    }

    fn create_relation(&self, relation: &NewRelation) -> Result<String, StoreError> {
        let mut state = self.state.borrow_mut();
        state.calls.relation_creates += 1;
        let id = state.next_id();
        state.relations.push(json!({
            "_id": id,
            "active": relation.active,
            "entity1": relation.entity1,
            "entity2": relation.entity2,
            "relationType": relation.relation_type,
        }));
        Ok(id)
    }
}
