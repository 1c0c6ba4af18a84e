//! `mango validate`: parse and check a rules file offline.

use std::path::PathBuf;

use crate::rules::load_rules;
use crate::CliError;

pub fn cmd_validate(path: PathBuf, json: bool) -> Result<(), CliError> {
    let rules = load_rules(&path)?;

    if json {
        let out = serde_json::json!({
            "valid": true,
            "name": rules.name,
            "columns": rules.mapping,
            "relations": rules.relations.iter().map(|r| &r.name).collect::<Vec<_>>(),
            "delimited": rules.delimited_fields.keys().collect::<Vec<_>>(),
        });
        println!("{out}");
    } else {
        eprintln!(
            "{}: ok ({} columns, {} relations)",
            path.display(),
            rules.mapping.len(),
            rules.relations.len()
        );
    }
    Ok(())
}
