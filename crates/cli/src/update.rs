//! `mango update`: overwrite fields of one existing entity.

use std::path::PathBuf;

use mango_client::Properties;
use serde_json::Value;

use crate::rules::{connect, load_rules};
use crate::CliError;

pub fn cmd_update(
    rules_path: PathBuf,
    entity_type: String,
    key: String,
    assignments: Vec<String>,
    json: bool,
    password: Option<String>,
) -> Result<(), CliError> {
    let properties = parse_assignments(&assignments)?;
    let rules = load_rules(&rules_path)?;
    let store = connect(&rules, password)?;

    let result = mango_recon::update(&rules, &store, &entity_type, &key, &properties)?;

    if json {
        println!("{result}");
    }
    eprintln!("updated {entity_type} '{key}' ({} fields)", properties.len());
    Ok(())
}

/// `field=value` pairs; the value may contain further `=`.
fn parse_assignments(raw: &[String]) -> Result<Properties, CliError> {
    let mut properties = Properties::new();
    for assignment in raw {
        let Some((field, value)) = assignment.split_once('=') else {
            return Err(CliError::usage(format!("--set expects field=value, got '{assignment}'")));
        };
        let field = field.trim();
        if field.is_empty() {
            return Err(CliError::usage(format!("--set '{assignment}': field name is empty")));
        }
        properties.insert(field.to_string(), Value::String(value.to_string()));
    }
    Ok(properties)
}
