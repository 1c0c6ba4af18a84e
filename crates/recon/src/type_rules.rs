//! Per-type lookup rules: which field identifies an entity, and which
//! mandatory properties an entity type carries.

use std::collections::HashMap;

use crate::config::{DefaultPropertyRule, ImportRules, ReferenceLookup};

/// Identifying field for entity types without an override.
pub const DEFAULT_IDENTIFYING_FIELD: &str = "description";

const BUILTIN_IDENTIFYING_FIELDS: &[(&str, &str)] = &[
    ("group", "name"),
    ("appellation", "name"),
    ("source", "title"),
];

#[derive(Debug, Clone)]
pub struct TypeRules {
    /// Lowercased display name -> identifying field
    identifying: HashMap<String, String>,
    defaults: Vec<DefaultPropertyRule>,
}

impl TypeRules {
    /// Built-in tables only.
    pub fn builtin() -> Self {
        let identifying = BUILTIN_IDENTIFYING_FIELDS
            .iter()
            .map(|(display, field)| (display.to_string(), field.to_string()))
            .collect();

        let defaults = vec![DefaultPropertyRule {
            entity_type: "appellation".into(),
            property: "appellationType".into(),
            reference: ReferenceLookup {
                collection: "types".into(),
                field: "name".into(),
                value: "object".into(),
            },
        }];

        Self { identifying, defaults }
    }

    /// Built-ins overlaid with the rules file's `identifying_fields` and
    /// `default_properties`.
    pub fn from_rules(rules: &ImportRules) -> Self {
        let mut merged = Self::builtin();
        for (display, field) in &rules.identifying_fields {
            merged.identifying.insert(display.to_lowercase(), field.clone());
        }
        for rule in &rules.default_properties {
            merged.set_default(rule.clone());
        }
        merged
    }

    /// Add a default-property rule, replacing any rule for the same
    /// (entity type, property).
    pub fn set_default(&mut self, rule: DefaultPropertyRule) {
        match self
            .defaults
            .iter_mut()
            .find(|r| r.entity_type == rule.entity_type && r.property == rule.property)
        {
            Some(existing) => *existing = rule,
            None => self.defaults.push(rule),
        }
    }

    /// Identifying field for a lowercased display name.
    pub fn identifying_field(&self, display_lower: &str) -> &str {
        self.identifying
            .get(display_lower)
            .map(String::as_str)
            .unwrap_or(DEFAULT_IDENTIFYING_FIELD)
    }

    /// Default-property rules for a collection name.
    pub fn defaults_for<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a DefaultPropertyRule> + 'a {
        self.defaults.iter().filter(move |r| r.entity_type == collection)
    }
}

impl Default for TypeRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_identifying_fields() {
        let rules = TypeRules::builtin();
        assert_eq!(rules.identifying_field("group"), "name");
        assert_eq!(rules.identifying_field("appellation"), "name");
        assert_eq!(rules.identifying_field("source"), "title");
        assert_eq!(rules.identifying_field("fruit"), DEFAULT_IDENTIFYING_FIELD);
    }

    #[test]
    fn builtin_appellation_default() {
        let rules = TypeRules::builtin();
        let defaults: Vec<_> = rules.defaults_for("appellation").collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].property, "appellationType");
        assert_eq!(defaults[0].reference.value, "object");
        assert_eq!(rules.defaults_for("fruit").count(), 0);
    }

    #[test]
    fn rules_file_overrides_and_extends() {
        let rules = ImportRules::from_toml(
            r#"
[server]
url = "http://localhost/api"
user = "u"

[mapping]
place = "Place"

[identifying_fields]
Place = "label"
source = "name"

[[default_properties]]
entity_type = "appellation"
property = "appellationType"
reference = { collection = "types", field = "name", value = "person" }

[[default_properties]]
entity_type = "place"
property = "placeType"
reference = { collection = "types", field = "name", value = "city" }
"#,
        )
        .unwrap();

        let merged = TypeRules::from_rules(&rules);
        assert_eq!(merged.identifying_field("place"), "label");
        assert_eq!(merged.identifying_field("source"), "name");
        assert_eq!(merged.identifying_field("group"), "name");

        let appellation: Vec<_> = merged.defaults_for("appellation").collect();
        assert_eq!(appellation.len(), 1);
        assert_eq!(appellation[0].reference.value, "person");
        assert_eq!(merged.defaults_for("place").count(), 1);
    }
}
