//! Entity find-or-create.

use mango_client::{Properties, RemoteStore};
use serde_json::Value;

use crate::config::ReferenceLookup;
use crate::error::ReconError;
use crate::identity::entity_selector;
use crate::model::Merged;
use crate::reconciler::Reconciler;

impl<S: RemoteStore + ?Sized> Reconciler<'_, S> {
    /// Return the id of the entity of type `display_name` matching
    /// `key_value` (in the type's identifying field) and every `extra`
    /// property, creating it when none exists.
    ///
    /// Only the entity-type and reference caches are consulted; entity
    /// existence is always asked of the store.
    pub fn merge_entity(
        &mut self,
        display_name: &str,
        key_value: &str,
        extra: &Properties,
    ) -> Result<Merged, ReconError> {
        let (collection, selector) = self.resolve_selector(display_name, key_value, extra)?;

        if let Some(existing) = self.store.query_entity(&collection, &selector)? {
            self.stats.entities_matched += 1;
            return Ok(Merged::matched(existing.id));
        }

        let mut properties = selector;
        properties.insert("active".into(), Value::Bool(true));
        let id = self.store.create_entity(&collection, &properties)?;
        log::debug!("created {collection} '{key_value}' -> {id}");
        self.stats.entities_created += 1;
        Ok(Merged::created(id))
    }

    /// Overwrite `extra` onto an existing entity. The entity is looked up by
    /// its identity only (identifying field plus type defaults), so changed
    /// values can be written over the old ones.
    ///
    /// When several records share that identity (an import with property
    /// columns creates one per property combination), the first record the
    /// store returns is updated and the others are left untouched.
    pub fn update_entity(
        &mut self,
        display_name: &str,
        key_value: &str,
        extra: &Properties,
    ) -> Result<Value, ReconError> {
        let (collection, identity) =
            self.resolve_selector(display_name, key_value, &Properties::new())?;

        let existing = self.store.query_entity(&collection, &identity)?.ok_or_else(|| {
            ReconError::EntityNotFound {
                entity_type: display_name.to_string(),
                key: key_value.to_string(),
            }
        })?;

        let mut properties = extra.clone();
        properties.extend(identity);
        let result = self.store.update_entity(&collection, &existing.id, &properties)?;
        log::info!("updated {collection} '{key_value}' ({})", existing.id);
        Ok(result)
    }

    /// Collection and full lookup selector for an entity.
    fn resolve_selector(
        &mut self,
        display_name: &str,
        key_value: &str,
        extra: &Properties,
    ) -> Result<(String, Properties), ReconError> {
        let collection = self.collection_for(display_name)?;
        let rules = self.rules;
        let field = rules.identifying_field(&display_name.to_lowercase());

        let mut defaults = Properties::new();
        for rule in rules.defaults_for(&collection) {
            let id = self.resolve_reference(&rule.reference)?;
            defaults.insert(rule.property.clone(), Value::String(id));
        }

        let selector = entity_selector(field, key_value, extra, defaults);
        Ok((collection, selector))
    }

    /// Id of a default-property reference entity, resolved once per run.
    fn resolve_reference(&mut self, lookup: &ReferenceLookup) -> Result<String, ReconError> {
        if let Some(id) = self.caches.references.get(lookup) {
            return Ok(id.clone());
        }

        let mut selector = Properties::new();
        selector.insert(lookup.field.clone(), Value::String(lookup.value.clone()));
        let found = self.store.query_entity(&lookup.collection, &selector)?.ok_or_else(|| {
            ReconError::MissingReference {
                collection: lookup.collection.clone(),
                field: lookup.field.clone(),
                value: lookup.value.clone(),
            }
        })?;

        self.caches.references.insert(lookup.clone(), found.id.clone());
        Ok(found.id)
    }
}
