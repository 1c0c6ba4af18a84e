use std::fmt;

use mango_client::StoreError;

#[derive(Debug)]
pub enum ReconError {
    /// Remote store failure (auth, transport, protocol, rejected request).
    Store(StoreError),
    /// Entity type display name has no active counterpart in the store.
    UnknownEntityType(String),
    /// Update requested for an entity that does not exist.
    EntityNotFound { entity_type: String, key: String },
    /// A per-type default property points at a reference entity that does not exist.
    MissingReference { collection: String, field: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Rules validation error (unmapped column, empty delimiter, etc.).
    ConfigValidation(String),
    /// Column referenced by the rules is absent from the dataset.
    MissingColumn(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::UnknownEntityType(name) => {
                write!(f, "unknown entity type '{name}' (no active type with that display name)")
            }
            Self::EntityNotFound { entity_type, key } => {
                write!(f, "cannot update non-existent {entity_type} entity '{key}'")
            }
            Self::MissingReference { collection, field, value } => {
                write!(f, "reference entity not found: {collection} where {field} = '{value}'")
            }
            Self::ConfigParse(msg) => write!(f, "rules parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "rules validation error: {msg}"),
            Self::MissingColumn(column) => write!(f, "dataset has no column '{column}'"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ReconError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
