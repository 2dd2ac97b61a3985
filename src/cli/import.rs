use std::path::PathBuf;

use crate::error::Result;
use crate::ingest::{ingest, Ledger};
use crate::models::{Row, Transaction};
use crate::repository::LedgerRepository;
use crate::settings::Settings;
use crate::sources::read_rows;
use crate::store::Store;

use super::open_repo;

/// Store `rows` read from a file.
///
/// Replacing keeps the file as it is, header and noise rows included.
/// Appending stores the recognized transactions in the ledger's own column
/// order, so the file's header layout does not matter.
pub(crate) fn import_rows<S: Store>(
    repo: &LedgerRepository<S>,
    rows: &[Row],
    replace: bool,
) -> Result<Ledger> {
    let recognized = ingest(rows);
    if replace {
        repo.replace_all(rows)?;
    } else {
        let normalized: Vec<Row> = recognized.iter().map(Transaction::to_row).collect();
        repo.append_rows(&normalized)?;
    }
    Ok(recognized)
}

pub fn run(settings: &Settings, file: &str, replace: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    let rows = read_rows(&file_path)?;

    let repo = open_repo(settings)?;
    let recognized = import_rows(&repo, &rows, replace)?;

    if replace {
        println!(
            "{} rows loaded, {} transactions recognized",
            rows.len(),
            recognized.len()
        );
    } else {
        println!("{} transactions appended", recognized.len());
    }
    if recognized.unparsed_dates > 0 || recognized.unparsed_amounts > 0 {
        println!(
            "{} unreadable dates, {} unreadable amounts (kept for manual correction)",
            recognized.unparsed_dates, recognized.unparsed_amounts
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{select_period, Period};
    use crate::store::{SqliteStore, LEDGER_SHEET};

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn repo() -> LedgerRepository<SqliteStore> {
        let repo = LedgerRepository::new(SqliteStore::open_in_memory().unwrap());
        repo.append_rows(&[row(&["02/01/2024", "Ana", "Despesa", "Padaria", "Supermercado", "Pix", "-12.00"])])
            .unwrap();
        repo
    }

    fn reordered_file() -> Vec<Row> {
        vec![
            row(&["Extrato"]),
            row(&["Valor", "Tipo", "Data", "Descrição", "Categoria", "Responsável", "Método"]),
            row(&["50,00", "Despesa", "15/01/2024", "Cinema", "Lazer", "Bruno", "Pix"]),
        ]
    }

    #[test]
    fn test_append_uses_the_file_header() {
        let repo = repo();
        let recognized = import_rows(&repo, &reordered_file(), false).unwrap();
        assert_eq!(recognized.len(), 1);

        // ledger header + existing row + the one recognized transaction
        let stored = repo.store().read_all_rows(LEDGER_SHEET).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(
            stored[2],
            row(&["15/01/2024", "Bruno", "Despesa", "Cinema", "Lazer", "Pix", "-50.00"])
        );

        let loaded = repo.ledger().unwrap();
        assert_eq!(loaded.ledger.unparsed_dates, 0);
        assert_eq!(loaded.ledger.unparsed_amounts, 0);
        let jan = select_period(&loaded.ledger, Period::new(2024, 1).unwrap());
        assert_eq!(jan.expense.len(), 2);
    }

    #[test]
    fn test_replace_keeps_the_file_rows() {
        let repo = repo();
        let file = reordered_file();
        import_rows(&repo, &file, true).unwrap();
        assert_eq!(repo.store().read_all_rows(LEDGER_SHEET).unwrap(), file);
        assert_eq!(repo.ledger().unwrap().ledger.len(), 1);
    }
}
