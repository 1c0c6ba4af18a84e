//! Composite identities used as cache keys and query selectors.
//!
//! Keys are structured and hashed field by field, so ("AB", "C") and
//! ("A", "BC") never collide. Values are compared exactly: no case folding
//! or trimming happens here.

use mango_client::Properties;
use serde_json::Value;

/// Identity of a relation type: name plus source and target entity type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationTypeKey {
    pub name: String,
    pub source: String,
    pub target: String,
}

impl RelationTypeKey {
    pub fn new(name: &str, source: &str, target: &str) -> Self {
        Self { name: name.to_string(), source: source.to_string(), target: target.to_string() }
    }
}

/// Identity of a relation: ordered endpoints plus relation type id.
/// `(a, b)` and `(b, a)` are different relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    pub entity1: String,
    pub entity2: String,
    pub relation_type: String,
}

impl RelationKey {
    pub fn new(entity1: &str, entity2: &str, relation_type: &str) -> Self {
        Self {
            entity1: entity1.to_string(),
            entity2: entity2.to_string(),
            relation_type: relation_type.to_string(),
        }
    }
}

/// Full property selector for an entity lookup.
///
/// Layering, later wins: caller-supplied extras, then per-type defaults,
/// then the identifying field.
pub fn entity_selector(
    identifying_field: &str,
    key_value: &str,
    extra: &Properties,
    defaults: Properties,
) -> Properties {
    let mut selector = extra.clone();
    selector.extend(defaults);
    selector.insert(identifying_field.to_string(), Value::String(key_value.to_string()));
    selector
}
