use serde_json::Value;

use crate::error::StoreError;
use crate::records::{
    EntityRecord, EntityTypeRecord, NewRelation, NewRelationType, Properties, RelationRecord,
    RelationTypeRecord,
};

/// Request/response operations the reconciliation engine issues against the
/// remote graph store.
///
/// Implementations do not cache and do not check existence before creating;
/// that is the engine's job.
pub trait RemoteStore {
    /// All active entity types (`collectionName=types&active=true`).
    fn active_entity_types(&self) -> Result<Vec<EntityTypeRecord>, StoreError>;

    /// First entity in `collection` whose fields match every selector entry.
    /// An empty result set is `Ok(None)`, not an error.
    fn query_entity(
        &self,
        collection: &str,
        selector: &Properties,
    ) -> Result<Option<EntityRecord>, StoreError>;

    /// Create an entity unconditionally. Returns the new identifier.
    fn create_entity(&self, collection: &str, properties: &Properties) -> Result<String, StoreError>;

    /// Overwrite fields of an existing entity.
    fn update_entity(
        &self,
        collection: &str,
        id: &str,
        properties: &Properties,
    ) -> Result<Value, StoreError>;

    fn active_relation_types(&self) -> Result<Vec<RelationTypeRecord>, StoreError>;

    fn relations(&self) -> Result<Vec<RelationRecord>, StoreError>;

    fn create_relation_type(&self, relation_type: &NewRelationType) -> Result<String, StoreError>;

    fn create_relation(&self, relation: &NewRelation) -> Result<String, StoreError>;
}
