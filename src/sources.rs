use std::path::Path;

use log::info;

use crate::error::{CaixaError, Result};
use crate::models::Row;

/// Raw rows of a CSV file. No header is assumed and ragged rows are kept.
pub fn read_csv_rows(file_path: &Path) -> Result<Vec<Row>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        // decimal comma, so a value like 2.125 is not read as a thousands group
        Data::Float(f) => f.to_string().replace('.', ","),
        Data::Bool(b) => b.to_string(),
        // keep the whole-day serial so the date normalizer can read it
        Data::DateTime(dt) => format!("{}", dt.as_f64().floor() as i64),
    }
}

/// Raw rows of the first worksheet of an XLSX workbook.
#[cfg(feature = "xlsx")]
pub fn read_xlsx_rows(file_path: &Path) -> Result<Vec<Row>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| CaixaError::Other(format!("Failed to open XLSX: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CaixaError::Other("Workbook has no worksheets".to_string()))?
        .map_err(|e| CaixaError::Other(format!("Failed to read worksheet: {e}")))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn has_extension(file_path: &Path, ext: &str) -> bool {
    file_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Read raw rows from a CSV or (with the `xlsx` feature) XLSX file.
pub fn read_rows(file_path: &Path) -> Result<Vec<Row>> {
    if !file_path.exists() {
        return Err(CaixaError::Other(format!("File not found: {}", file_path.display())));
    }
    let rows = if has_extension(file_path, "xlsx") || has_extension(file_path, "xls") {
        read_workbook(file_path)?
    } else {
        read_csv_rows(file_path)?
    };
    info!("read {} rows from {}", rows.len(), file_path.display());
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn read_workbook(file_path: &Path) -> Result<Vec<Row>> {
    read_xlsx_rows(file_path)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(file_path: &Path) -> Result<Vec<Row>> {
    Err(CaixaError::Other(format!(
        "{} is a spreadsheet; rebuild with the `xlsx` feature or export it to CSV",
        file_path.display()
    )))
}
