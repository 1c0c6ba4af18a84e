// mango - idempotent import of tabular records into a remote graph store

mod exit_codes;
mod import;
mod rules;
mod update;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use mango_client::StoreError;
use mango_io::IoError;
use mango_recon::ReconError;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_AUTH, EXIT_ERROR, EXIT_INPUT, EXIT_INVALID_RULES, EXIT_NOT_FOUND, EXIT_OUTPUT,
    EXIT_PROTOCOL, EXIT_REMOTE, EXIT_SUCCESS, EXIT_UNKNOWN_ENTITY_TYPE, EXIT_USAGE,
};

/// Environment variable holding the log filter (`info`, `mango_recon=debug`, ...).
const LOG_ENV: &str = "MANGO_LOG";

#[derive(Parser)]
#[command(name = "mango")]
#[command(about = "Import annotated tables into a remote graph store, idempotently")]
#[command(version)]
struct Cli {
    /// Debug logging (overrides MANGO_LOG)
    #[arg(short, long, global = true, action = ArgAction::SetTrue, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only (overrides MANGO_LOG)
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the entities and relations of a table into the store
    #[command(after_help = "\
Examples:
  mango import wines.xlsx --rules wines.toml
  mango import wines.csv --rules wines.toml --output runs/2026-10-17
  mango import wines.xlsx --rules wines.toml --sheet Catalogue --json
  mango import wines.csv --rules wines.toml --dry-run")]
    Import {
        /// Input table (.csv, .tsv, .txt, .xlsx, .xls, .xlsb, .ods)
        data: PathBuf,

        /// Import rules (TOML)
        #[arg(long, short)]
        rules: PathBuf,

        /// Directory for entities.json, relations.json and summary.json
        #[arg(long, short, default_value = "output")]
        output: PathBuf,

        /// Worksheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Field delimiter for delimited text (default: sniffed)
        #[arg(long)]
        delimiter: Option<String>,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Run against an in-memory store seeded from the rules; nothing is sent
        #[arg(long)]
        dry_run: bool,

        /// Server password (overrides server.password)
        #[arg(long, env = "MANGO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check a rules file without contacting the server
    #[command(after_help = "\
Examples:
  mango validate wines.toml
  mango validate wines.toml --json")]
    Validate {
        rules: PathBuf,

        /// Print the result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Overwrite fields of one existing entity
    #[command(after_help = "\
Examples:
  mango update --rules wines.toml --entity-type Appellation --key Pomerol --set vintage=2016")]
    Update {
        /// Import rules (TOML); only [server] and the type tables are used
        #[arg(long, short)]
        rules: PathBuf,

        /// Entity type display name
        #[arg(long)]
        entity_type: String,

        /// Value of the type's identifying field
        #[arg(long)]
        key: String,

        /// Field to write, as field=value (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,

        /// Print the server's response as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Server password (overrides server.password)
        #[arg(long, env = "MANGO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Import { data, rules, output, sheet, delimiter, json, dry_run, password } => {
            import::cmd_import(import::ImportArgs {
                data,
                rules,
                output,
                sheet,
                delimiter,
                json,
                dry_run,
                password,
            })
        }
        Commands::Validate { rules, json } => validate::cmd_validate(rules, json),
        Commands::Update { rules, entity_type, key, set, json, password } => {
            update::cmd_update(rules, entity_type, key, set, json, password)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Log records from the library crates go through the `log` facade and are
/// picked up by the subscriber's log bridge.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: None }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Auth(_) => EXIT_AUTH,
            StoreError::Protocol { .. } => EXIT_PROTOCOL,
            StoreError::Remote(_) | StoreError::Rejected { .. } => EXIT_REMOTE,
            StoreError::Config(_) => EXIT_ERROR,
        };
        let hint = match &err {
            StoreError::Auth(_) => Some("check server.user and the password (--password or MANGO_PASSWORD)"),
            StoreError::Remote(_) => Some("check server.url and that the server is up"),
            _ => None,
        };
        CliError { code, message: err.to_string(), hint: hint.map(String::from) }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::Store(store) => store.into(),
            ReconError::UnknownEntityType(_) => CliError::new(EXIT_UNKNOWN_ENTITY_TYPE, err.to_string())
                .with_hint("types are matched by display name, ignoring case; check [mapping]"),
            ReconError::EntityNotFound { .. } | ReconError::MissingReference { .. } => {
                CliError::new(EXIT_NOT_FOUND, err.to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                CliError::new(EXIT_INVALID_RULES, err.to_string())
            }
            ReconError::MissingColumn(_) => CliError::new(EXIT_INPUT, err.to_string())
                .with_hint("column names are matched exactly against the header row"),
        }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let code = match err {
            IoError::Write { .. } => EXIT_OUTPUT,
            IoError::Read { .. } | IoError::Parse { .. } | IoError::UnsupportedFormat(_) => EXIT_INPUT,
        };
        CliError::new(code, err.to_string())
    }
}
