//! Relation type find-or-create.

use std::collections::HashMap;

use mango_client::{NewRelationType, Properties, RemoteStore};
use serde_json::Value;

use crate::error::ReconError;
use crate::identity::RelationTypeKey;
use crate::model::Merged;
use crate::reconciler::Reconciler;

/// Collection holding one record per entity type.
pub const TYPES_COLLECTION: &str = "types";

impl<S: RemoteStore + ?Sized> Reconciler<'_, S> {
    /// Id of the relation type `name` from `source_type` to `target_type`
    /// (collection names), creating it when the run cache has no such triple.
    ///
    /// Pre-existing remote relation types are only seen through the initial
    /// full fetch; a miss is not re-checked remotely before creating.
    pub fn resolve_relation_type(
        &mut self,
        name: &str,
        source_type: &str,
        target_type: &str,
    ) -> Result<Merged, ReconError> {
        let key = RelationTypeKey::new(name, source_type, target_type);
        if let Some(id) = self.relation_types()?.get(&key) {
            return Ok(Merged::matched(id.clone()));
        }

        let source_type_id = self.type_record_id(source_type)?;
        let target_type_id = self.type_record_id(target_type)?;
        let id = self.store.create_relation_type(&NewRelationType {
            active: true,
            name: name.to_string(),
            source_type_id,
            target_type_id,
        })?;
        log::info!("created relation type {name} ({source_type} -> {target_type}) -> {id}");

        self.relation_types()?.insert(key, id.clone());
        self.stats.relation_types_created += 1;
        Ok(Merged::created(id))
    }

    /// Relation types, fetched on first use.
    pub(crate) fn relation_types(&mut self) -> Result<&mut HashMap<RelationTypeKey, String>, ReconError> {
        if self.caches.relation_types.is_none() {
            let fetched: HashMap<RelationTypeKey, String> = self
                .store
                .active_relation_types()?
                .into_iter()
                .map(|r| (RelationTypeKey::new(&r.name, &r.source.name, &r.target.name), r.id))
                .collect();
            log::info!("loaded {} active relation types", fetched.len());
            self.caches.relation_types = Some(fetched);
        }
        Ok(self.caches.relation_types.get_or_insert_with(HashMap::new))
    }

    /// Id of the `types` record describing an entity type.
    fn type_record_id(&self, type_name: &str) -> Result<String, ReconError> {
        let mut selector = Properties::new();
        selector.insert("name".into(), Value::String(type_name.to_string()));
        self.store
            .query_entity(TYPES_COLLECTION, &selector)?
            .map(|record| record.id)
            .ok_or_else(|| ReconError::UnknownEntityType(type_name.to_string()))
    }
}
