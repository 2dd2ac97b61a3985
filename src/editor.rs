//! Whole-period editing through a CSV round trip.
//!
//! `export_period` writes the period's rows under two comment lines: a
//! checksum of the ledger as it was read and the period itself.
//! `save_period` refuses the edited file if the ledger has changed since,
//! so a concurrent edit is never silently overwritten, and always writes
//! back into the period the file was exported from.

use std::io::{BufRead, BufReader, Read, Write};

use log::{info, warn};

use crate::error::{CaixaError, Result};
use crate::ingest::ingest;
use crate::models::{ledger_header_row, Row};
use crate::period::{select_period, Period};
use crate::repository::{checksum, LedgerRepository};
use crate::store::{Store, BACKUP_SHEET, LEDGER_SHEET};

const CHECKSUM_PREFIX: &str = "# checksum:";
const PERIOD_PREFIX: &str = "# period:";

/// Write the rows of `period` as CSV. Returns the number of data rows.
pub fn export_period<S: Store, W: Write>(
    repo: &LedgerRepository<S>,
    period: Period,
    mut out: W,
) -> Result<usize> {
    // the checksum must describe exactly what is exported
    repo.invalidate();
    let loaded = repo.ledger()?;
    writeln!(out, "{CHECKSUM_PREFIX} {}", loaded.checksum)?;
    writeln!(out, "{PERIOD_PREFIX} {:04}-{:02}", period.year(), period.month())?;

    let slice = select_period(&loaded.ledger, period);
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(ledger_header_row())?;
    for t in &slice.rows {
        wtr.write_record(t.to_row())?;
    }
    wtr.flush()?;
    info!("exported {} rows of {period}", slice.rows.len());
    Ok(slice.rows.len())
}

/// An edited export: the checksum and period it was taken at, and its raw rows.
#[derive(Debug, Clone)]
pub struct EditedPeriod {
    pub checksum: String,
    pub period: Period,
    pub rows: Vec<Row>,
}

fn missing_line(what: &str) -> CaixaError {
    CaixaError::Other(format!(
        "edited file has no {what} line; export the period again"
    ))
}

pub fn read_edited<R: Read>(input: R) -> Result<EditedPeriod> {
    let mut reader = BufReader::new(input);
    let mut checksum = None;
    let mut period = None;
    while reader.fill_buf()?.starts_with(b"#") {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim();
        if let Some(c) = line.strip_prefix(CHECKSUM_PREFIX) {
            checksum = Some(c.trim().to_string()).filter(|c| !c.is_empty());
        } else if let Some(p) = line.strip_prefix(PERIOD_PREFIX) {
            period = Some(p.parse::<Period>()?);
        }
    }
    let checksum = checksum.ok_or_else(|| missing_line("checksum"))?;
    let period = period.ok_or_else(|| missing_line("period"))?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let rows = rdr
        .records()
        .map(|r| Ok(r?.iter().map(String::from).collect()))
        .collect::<Result<Vec<Row>>>()?;
    Ok(EditedPeriod {
        checksum,
        period,
        rows,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    /// Rows outside the period carried over unchanged.
    pub kept: usize,
    /// Period rows dropped in favour of the edited ones.
    pub replaced: usize,
    pub written: usize,
    pub backed_up: bool,
}

/// Replace the rows of the exported period with `edited`.
///
/// Rows outside the period, including rows whose date cannot be read, are
/// kept as they are. The previous ledger is appended to the backup sheet
/// first; a failed backup is logged and does not stop the save.
pub fn save_period<S: Store>(
    repo: &LedgerRepository<S>,
    edited: &EditedPeriod,
) -> Result<SaveSummary> {
    let period = edited.period;
    let raw = repo.store().read_all_rows(LEDGER_SHEET)?;
    let actual = checksum(&raw);
    if actual != edited.checksum {
        return Err(CaixaError::StaleLedger {
            expected: edited.checksum.clone(),
            actual,
        });
    }

    let new_rows: Vec<Row> = ingest(&edited.rows).iter().map(|t| t.to_row()).collect();

    let backed_up = match backup_rows(repo.store(), &raw) {
        Ok(()) => true,
        Err(e) => {
            warn!("backup before saving {period} failed: {e}");
            false
        }
    };

    let current = ingest(&raw);
    let (inside, outside): (Vec<_>, Vec<_>) = current
        .iter()
        .partition(|t| t.date.is_some_and(|d| period.contains(d)));

    let mut rows = Vec::with_capacity(outside.len() + new_rows.len() + 1);
    rows.push(ledger_header_row());
    rows.extend(outside.iter().map(|t| t.to_row()));
    rows.extend(new_rows.iter().cloned());
    repo.replace_all(&rows)?;

    let summary = SaveSummary {
        kept: outside.len(),
        replaced: inside.len(),
        written: new_rows.len(),
        backed_up,
    };
    info!("saved {period}: {summary:?}");
    Ok(summary)
}

fn backup_rows<S: Store>(store: &S, rows: &[Row]) -> Result<()> {
    store.ensure_header(BACKUP_SHEET, &ledger_header_row())?;
    store.append_rows(BACKUP_SHEET, rows)
}
