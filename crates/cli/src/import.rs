//! `mango import`: merge a table's entities and relations into the store.

use std::path::PathBuf;

use mango_io::LoadOptions;
use mango_recon::{ImportReport, MemoryStore, TypeRules};

use crate::rules::{connect, load_rules};
use crate::CliError;

pub struct ImportArgs {
    pub data: PathBuf,
    pub rules: PathBuf,
    pub output: PathBuf,
    pub sheet: Option<String>,
    pub delimiter: Option<String>,
    pub json: bool,
    pub dry_run: bool,
    pub password: Option<String>,
}

pub fn cmd_import(args: ImportArgs) -> Result<(), CliError> {
    let rules = load_rules(&args.rules)?;
    let options = LoadOptions {
        delimiter: args.delimiter.as_deref().map(parse_delimiter).transpose()?,
        sheet: args.sheet,
    };

    let dataset = mango_io::load_dataset(&args.data, &options)?;
    log::info!("read {} rows from {}", dataset.len(), args.data.display());

    let mut report = if args.dry_run {
        let store = MemoryStore::for_rules(&rules, &TypeRules::from_rules(&rules));
        let report = mango_recon::run(&rules, &dataset, &store)?;
        log::warn!("dry run: nothing was sent to {}", rules.server.url);
        report
    } else {
        let store = connect(&rules, args.password)?;
        mango_recon::run(&rules, &dataset, &store)?
    };
    report.meta.input_blake3 = Some(mango_io::hash_file(&args.data)?);

    if !args.dry_run {
        let paths = mango_io::write_artifacts(&args.output, &report)?;
        eprintln!("wrote {}", paths.entities.display());
        eprintln!("wrote {}", paths.relations.display());
        eprintln!("wrote {}", paths.summary.display());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    eprintln!("{}", summary_line(&report));
    Ok(())
}

fn summary_line(report: &ImportReport) -> String {
    let s = &report.summary;
    let skipped: usize = s.rows_skipped.values().sum();
    format!(
        "{} rows: {} entities created, {} matched; {} relation types created; {} relations created, {} matched; {} row/rule pairs skipped",
        report.meta.rows,
        s.merges.entities_created,
        s.merges.entities_matched,
        s.merges.relation_types_created,
        s.merges.relations_created,
        s.merges.relations_matched,
        skipped,
    )
}

/// Single-byte delimiter; `\t` and `tab` mean a tab.
fn parse_delimiter(raw: &str) -> Result<u8, CliError> {
    match raw {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        _ if raw.len() == 1 && raw.is_ascii() => Ok(raw.as_bytes()[0]),
        _ => Err(CliError::usage(format!("delimiter must be a single ASCII character, got '{raw}'"))),
    }
}
