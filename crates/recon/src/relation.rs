//! Relation find-or-create.

use std::collections::HashMap;

use mango_client::{NewRelation, RemoteStore};

use crate::error::ReconError;
use crate::identity::RelationKey;
use crate::model::Merged;
use crate::reconciler::Reconciler;

impl<S: RemoteStore + ?Sized> Reconciler<'_, S> {
    /// Id of the `name` relation from `entity1` to `entity2`, creating it
    /// (and its relation type, if needed) when the run cache has no match.
    /// Direction matters: swapping the entities is a different relation.
    pub fn merge_relation(
        &mut self,
        name: &str,
        source_type: &str,
        target_type: &str,
        entity1: &str,
        entity2: &str,
    ) -> Result<Merged, ReconError> {
        let relation_type = self.resolve_relation_type(name, source_type, target_type)?.id;

        let key = RelationKey::new(entity1, entity2, &relation_type);
        if let Some(id) = self.relations()?.get(&key).cloned() {
            self.stats.relations_matched += 1;
            return Ok(Merged::matched(id));
        }

        let id = self.store.create_relation(&NewRelation {
            active: true,
            entity1: entity1.to_string(),
            entity2: entity2.to_string(),
            relation_type,
        })?;
        log::debug!("created {name} {entity1} -> {entity2} -> {id}");

        self.relations()?.insert(key, id.clone());
        self.stats.relations_created += 1;
        Ok(Merged::created(id))
    }

    /// Relations, fetched on first use. Records without a usable id, or whose
    /// endpoints or type are not plain strings, are left out.
    pub(crate) fn relations(&mut self) -> Result<&mut HashMap<RelationKey, String>, ReconError> {
        if self.caches.relations.is_none() {
            let records = self.store.relations()?;
            let total = records.len();
            let fetched: HashMap<RelationKey, String> = records
                .iter()
                .filter_map(|r| {
                    let (id, (entity1, entity2, relation_type)) = r.identity()?;
                    Some((RelationKey::new(entity1, entity2, relation_type), id))
                })
                .collect();
            if fetched.len() < total {
                log::debug!("ignored {} malformed relation records", total - fetched.len());
            }
            log::info!("loaded {} relations", fetched.len());
            self.caches.relations = Some(fetched);
        }
        Ok(self.caches.relations.get_or_insert_with(HashMap::new))
    }
}
