// Spreadsheet ingestion (xlsx, xls, xlsb, ods) via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use mango_recon::Dataset;

use crate::error::IoError;

/// Load one worksheet: `sheet` by name, or the first one. The first row of
/// the used range is the header row; every cell is read as text.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<Dataset, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IoError::parse(path, format!("no sheet named '{wanted}' (have: {})", names.join(", "))))?,
        None => names.first().cloned().ok_or_else(|| IoError::parse(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::parse(path, format!("sheet '{name}': {e}")))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(IoError::parse(path, format!("sheet '{name}' is empty")));
    };

    let mut dataset = Dataset::new(header.iter().map(|c| cell_text(c).trim().to_string()).collect());
    for row in rows {
        dataset.push_row(row.iter().map(cell_text).collect());
    }
    log::debug!("read {} rows from sheet '{name}' of {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Text form of a cell. Integral numbers print without a fraction so that
/// `1999.0` keys the same entity as the CSV cell `1999`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(n) => number_text(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        // Date cells keep their serial number
        Data::DateTime(dt) => number_text(dt.as_f64()),
        Data::Error(e) => format!("#{e:?}"),
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
