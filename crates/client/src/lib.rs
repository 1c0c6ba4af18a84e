//! Remote store client: the only crate that speaks the wire contract.
//!
//! Covers authentication, entity query/create/update, relation-type and
//! relation listing and creation. No caching, no retries: every call is one
//! blocking request and every failure is surfaced as a [`StoreError`].

mod auth;
mod client;
mod error;
mod records;
mod store;

pub use auth::Credentials;
pub use client::{HttpStore, DEFAULT_TIMEOUT};
pub use error::StoreError;
pub use records::{
    EntityRecord, EntityTypeRecord, NewRelation, NewRelationType, Properties,
    RelationRecord, RelationTypeRecord, TypeRef, selector_value,
};
pub use store::RemoteStore;
