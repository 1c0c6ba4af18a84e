// File I/O for mango imports: tabular input, JSON artifacts

pub mod csv;
pub mod error;
pub mod hash;
pub mod json;
pub mod xlsx;

use std::path::Path;

use mango_recon::Dataset;

pub use error::IoError;
pub use hash::hash_file;
pub use json::{write_artifacts, ArtifactPaths};

/// How to read an input table.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field delimiter for delimited text; sniffed when unset.
    pub delimiter: Option<u8>,
    /// Worksheet name for spreadsheets; first sheet when unset.
    pub sheet: Option<String>,
}

/// Load a dataset, choosing the reader from the file extension.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => csv::load(path, options.delimiter),
        "tsv" | "tab" => csv::load(path, Some(options.delimiter.unwrap_or(b'\t'))),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::load(path, options.sheet.as_deref()),
        _ => Err(IoError::UnsupportedFormat(if ext.is_empty() { path.display().to_string() } else { ext })),
    }
}
