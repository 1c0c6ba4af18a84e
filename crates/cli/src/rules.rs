//! Rules loading and server connection shared by the commands.

use std::path::Path;
use std::time::Duration;

use mango_client::{Credentials, HttpStore};
use mango_recon::ImportRules;

use crate::CliError;

pub fn load_rules(path: &Path) -> Result<ImportRules, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read rules {}: {e}", path.display())))?;
    Ok(ImportRules::from_toml(&text)?)
}

/// Authenticate against the rules' server. `password` (flag or env) wins
/// over `server.password`.
pub fn connect(rules: &ImportRules, password: Option<String>) -> Result<HttpStore, CliError> {
    let server = &rules.server;
    let Some(password) = password.or_else(|| server.password.clone()) else {
        return Err(CliError::usage(format!("no password for server user '{}'", server.user))
            .with_hint("pass --password, set MANGO_PASSWORD, or add server.password to the rules"));
    };

    log::info!("connecting to {}", server.url);
    let creds = Credentials::new(&server.user, password);
    Ok(HttpStore::connect(&server.url, &creds, Duration::from_secs(server.timeout_secs))?)
}
