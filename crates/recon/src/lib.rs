//! `mango-recon`: idempotent import engine for a remote graph store.
//!
//! Pure engine crate: receives a loaded dataset and import rules, talks to
//! the store through [`mango_client::RemoteStore`], returns a report.
//! No CLI or file IO.

pub mod cache;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod identity;
pub mod memory;
pub mod model;
pub mod reconciler;
pub mod relation;
pub mod relation_type;
pub mod split;
pub mod type_rules;

pub use cache::RunCaches;
pub use config::{DefaultPropertyRule, ImportRules, ReferenceLookup, RelationRule, ServerConfig};
pub use engine::{run, update};
pub use error::ReconError;
pub use identity::{RelationKey, RelationTypeKey};
pub use memory::{CallCounts, MemoryStore};
pub use model::{
    ColumnSummary, Dataset, EntityLog, ImportMeta, ImportReport, ImportSummary, MergeStats,
    MergeStatus, Merged, RelationLog, Row,
};
pub use reconciler::Reconciler;
pub use split::split_field;
pub use type_rules::TypeRules;
