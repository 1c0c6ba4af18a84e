// CSV/TSV ingestion

use std::path::Path;

use mango_recon::Dataset;

use crate::error::IoError;

/// Load a delimited text file. The first record is the header row.
/// Without an explicit delimiter one is guessed from the first lines.
pub fn load(path: &Path, delimiter: Option<u8>) -> Result<Dataset, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    parse(&content, delimiter).map_err(|e| IoError::parse(path, e))
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::read(path, e))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(String::from).unwrap_or(s)),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

/// Pick the candidate delimiter that splits the sampled lines into the most
/// consistent field counts (more than one field required).
fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let field_count = |line: &str, delim: u8| {
        csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(Result::ok)
            .map_or(1, |r| r.len())
    };

    let mut best = (b',', 0usize);
    for delim in CANDIDATES {
        let Some(first) = sample.first().map(|l| field_count(*l, delim)) else {
            break;
        };
        if first <= 1 {
            continue;
        }
        let consistent = sample.iter().filter(|l| field_count(**l, delim) == first).count();
        let score = consistent * first;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

fn parse(content: &str, delimiter: u8) -> Result<Dataset, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err("no header row".into());
    }

    let mut dataset = Dataset::new(headers);
    for (i, record) in reader.records().enumerate() {
        // Header is line 1
        let record = record.map_err(|e| format!("line {}: {e}", i + 2))?;
        dataset.push_row(record.iter().map(String::from).collect());
    }
    Ok(dataset)
}
