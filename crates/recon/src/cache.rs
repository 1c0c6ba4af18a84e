//! Run-scoped lookup caches.
//!
//! Each cache starts unpopulated (`None`), is filled by one full remote
//! fetch the first time it is needed, and afterwards only grows as the run
//! creates records. Nothing here outlives a run.

use std::collections::HashMap;

use crate::config::ReferenceLookup;
use crate::identity::{RelationKey, RelationTypeKey};

#[derive(Debug, Default)]
pub struct RunCaches {
    /// Lowercased display name -> collection name
    pub(crate) entity_types: Option<HashMap<String, String>>,
    pub(crate) relation_types: Option<HashMap<RelationTypeKey, String>>,
    pub(crate) relations: Option<HashMap<RelationKey, String>>,
    /// Resolved default-property reference entities
    pub(crate) references: HashMap<ReferenceLookup, String>,
}

impl RunCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_types_loaded(&self) -> bool {
        self.entity_types.is_some()
    }

    pub fn relation_types_loaded(&self) -> bool {
        self.relation_types.is_some()
    }

    pub fn relations_loaded(&self) -> bool {
        self.relations.is_some()
    }

    /// Cached relation type id, if the cache is populated and holds the key.
    pub fn relation_type(&self, key: &RelationTypeKey) -> Option<&str> {
        self.relation_types.as_ref()?.get(key).map(String::as_str)
    }

    /// Cached relation id, if the cache is populated and holds the key.
    pub fn relation(&self, key: &RelationKey) -> Option<&str> {
        self.relations.as_ref()?.get(key).map(String::as_str)
    }

    pub fn relation_count(&self) -> usize {
        self.relations.as_ref().map_or(0, HashMap::len)
    }
}
