// JSON artifact output

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use mango_recon::{ImportMeta, ImportReport, ImportSummary};
use serde::Serialize;

use crate::error::IoError;

pub const ENTITIES_FILE: &str = "entities.json";
pub const RELATIONS_FILE: &str = "relations.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Paths of the files written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub entities: PathBuf,
    pub relations: PathBuf,
    pub summary: PathBuf,
}

/// Write the entity log, relation log and run summary of a finished import
/// into `dir`, creating it if needed.
pub fn write_artifacts(dir: &Path, report: &ImportReport) -> Result<ArtifactPaths, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::write(dir, e))?;

    let paths = ArtifactPaths {
        entities: dir.join(ENTITIES_FILE),
        relations: dir.join(RELATIONS_FILE),
        summary: dir.join(SUMMARY_FILE),
    };

    write_pretty(&paths.entities, &report.entities)?;
    write_pretty(&paths.relations, &report.relations)?;
    write_pretty(&paths.summary, &SummaryFile { meta: &report.meta, summary: &report.summary })?;
    Ok(paths)
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    meta: &'a ImportMeta,
    summary: &'a ImportSummary,
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|e| IoError::write(path, e))
}
