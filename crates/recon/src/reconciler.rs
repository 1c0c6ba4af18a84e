//! Find-or-create against the remote store, backed by the run caches.
//!
//! The merge operations live next to their concerns: entities in
//! `entity.rs`, relation types in `relation_type.rs`, relations in
//! `relation.rs`. All of them take `&mut self`, so merges sharing a cache
//! are serialized by the borrow checker.

use std::collections::HashMap;

use mango_client::RemoteStore;

use crate::cache::RunCaches;
use crate::error::ReconError;
use crate::model::MergeStats;
use crate::type_rules::TypeRules;

pub struct Reconciler<'a, S: RemoteStore + ?Sized> {
    pub(crate) store: &'a S,
    pub(crate) rules: &'a TypeRules,
    pub(crate) caches: &'a mut RunCaches,
    pub(crate) stats: MergeStats,
}

impl<'a, S: RemoteStore + ?Sized> Reconciler<'a, S> {
    /// Reconciler over caches owned by the caller.
    pub fn new(store: &'a S, rules: &'a TypeRules, caches: &'a mut RunCaches) -> Self {
        Self { store, rules, caches, stats: MergeStats::default() }
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    /// Collection name behind an entity type display name (case-insensitive).
    pub fn collection_for(&mut self, display_name: &str) -> Result<String, ReconError> {
        self.entity_types()?
            .get(&display_name.to_lowercase())
            .cloned()
            .ok_or_else(|| ReconError::UnknownEntityType(display_name.to_string()))
    }

    /// Active entity types, fetched on first use.
    pub(crate) fn entity_types(&mut self) -> Result<&HashMap<String, String>, ReconError> {
        if self.caches.entity_types.is_none() {
            let fetched: HashMap<String, String> = self
                .store
                .active_entity_types()?
                .into_iter()
                .map(|t| (t.display_name.to_lowercase(), t.name))
                .collect();
            log::info!("loaded {} active entity types", fetched.len());
            self.caches.entity_types = Some(fetched);
        }
        Ok(self.caches.entity_types.get_or_insert_with(HashMap::new))
    }
}
