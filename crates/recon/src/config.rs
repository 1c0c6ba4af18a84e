use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level rules
// ---------------------------------------------------------------------------

/// Declarative import rules, loaded once per run.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRules {
    #[serde(default)]
    pub name: Option<String>,
    pub server: ServerConfig,
    /// Column name -> entity type display name.
    pub mapping: BTreeMap<String, String>,
    /// Column name -> { source column -> entity field }.
    #[serde(default)]
    pub properties: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub relations: Vec<RelationRule>,
    /// Column name -> delimiter for multi-valued cells.
    #[serde(default)]
    pub delimited_fields: BTreeMap<String, String>,
    /// Entity type display name -> identifying field, merged over the built-ins.
    #[serde(default)]
    pub identifying_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub default_properties: Vec<DefaultPropertyRule>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub user: String,
    /// May be left out of the file and supplied at run time instead.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// Relation named `name` from the entity in column `entity1` to the entity
/// in column `entity2`, created for every qualifying row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationRule {
    pub name: String,
    pub entity1: String,
    pub entity2: String,
}

// ---------------------------------------------------------------------------
// Per-type default properties
// ---------------------------------------------------------------------------

/// Mandatory property injected into every entity of `entity_type`
/// (a collection name), whose value is the identifier of a fixed
/// reference entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultPropertyRule {
    pub entity_type: String,
    pub property: String,
    pub reference: ReferenceLookup,
}

/// Selects one reference entity: the first record in `collection` whose
/// `field` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ReferenceLookup {
    pub collection: String,
    pub field: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImportRules {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let rules: ImportRules =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.server.url.trim().is_empty() {
            return Err(ReconError::ConfigValidation("server.url must not be empty".into()));
        }

        if self.mapping.is_empty() {
            return Err(ReconError::ConfigValidation(
                "mapping must annotate at least one column".into(),
            ));
        }

        for (column, display) in &self.mapping {
            if display.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "mapping '{column}': entity type must not be empty"
                )));
            }
        }

        for column in self.properties.keys() {
            self.require_mapped("properties", column)?;
        }

        for (column, delimiter) in &self.delimited_fields {
            self.require_mapped("delimited_fields", column)?;
            if delimiter.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "delimited_fields '{column}': delimiter must not be empty"
                )));
            }
        }

        for rule in &self.relations {
            if rule.name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("relation name must not be empty".into()));
            }
            let context = format!("relation '{}'", rule.name);
            self.require_mapped(&context, &rule.entity1)?;
            self.require_mapped(&context, &rule.entity2)?;
        }

        for rule in &self.default_properties {
            if rule.entity_type.is_empty() || rule.property.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "default_properties entries need entity_type and property".into(),
                ));
            }
        }

        Ok(())
    }

    /// Delimiter configured for `column`, if it holds multi-valued cells.
    pub fn delimiter_for(&self, column: &str) -> Option<&str> {
        self.delimited_fields.get(column).map(String::as_str)
    }

    /// Every dataset column the rules read from.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.mapping.keys().map(String::as_str).collect();
        for props in self.properties.values() {
            columns.extend(props.keys().map(String::as_str));
        }
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    fn require_mapped(&self, context: &str, column: &str) -> Result<(), ReconError> {
        if self.mapping.contains_key(column) {
            Ok(())
        } else {
            Err(ReconError::ConfigValidation(format!(
                "{context}: column '{column}' has no entity type in [mapping]"
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
