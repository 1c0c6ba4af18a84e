//! Wire records exchanged with the remote store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity field values keyed by field name.
///
/// Ordered so that the same logical property set always produces the same
/// query string.
pub type Properties = BTreeMap<String, Value>;

/// Active entity type as listed by `entity/get?collectionName=types`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityTypeRecord {
    /// Backing collection name (e.g. "appellation")
    pub name: String,
    /// Human-facing name as configured in the store (any case)
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// First record matching an entity query.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: String,
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeRef {
    pub name: String,
}

/// Relation type as listed by `relation/getActiveRelationTypes`.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationTypeRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Source entity type
    #[serde(rename = "type")]
    pub source: TypeRef,
    /// Target entity type
    #[serde(rename = "relationType")]
    pub target: TypeRef,
}

/// Relation as listed by `relation/get`.
///
/// Every field is kept as raw JSON: the store may return populated objects,
/// numeric ids or nulls for some records, and only well-formed records are
/// usable as identity.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationRecord {
    #[serde(default, rename = "_id")]
    pub id: Value,
    #[serde(default)]
    pub entity1: Value,
    #[serde(default)]
    pub entity2: Value,
    #[serde(default, rename = "relationType")]
    pub relation_type: Value,
}

impl RelationRecord {
    /// Relation id with `(entity1, entity2, relationType)`, when the id is a
    /// string or number and the other three are plain strings.
    pub fn identity(&self) -> Option<(String, (&str, &str, &str))> {
        let id = match &self.id {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some((
            id,
            (self.entity1.as_str()?, self.entity2.as_str()?, self.relation_type.as_str()?),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelationType {
    pub active: bool,
    pub name: String,
    /// Identifier of the source entity type record
    #[serde(rename = "type")]
    pub source_type_id: String,
    /// Identifier of the target entity type record
    #[serde(rename = "relationType")]
    pub target_type_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelation {
    pub active: bool,
    pub entity1: String,
    pub entity2: String,
    #[serde(rename = "relationType")]
    pub relation_type: String,
}

/// String form of a property value as sent in a query selector.
pub fn selector_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
