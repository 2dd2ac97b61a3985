use std::path::Path;

use log::info;
use rusqlite::Connection;

use crate::error::{CaixaError, Result};
use crate::models::Row;

pub const LEDGER_SHEET: &str = "ledger";
pub const BILLS_SHEET: &str = "PagamentosMensais";
pub const PLAN_SHEET: &str = "Planejamento";
pub const BACKUP_SHEET: &str = "_backup_auto";

/// A workbook of named sheets holding rows of loosely typed text cells.
///
/// Writes are last-writer-wins; nothing here coordinates concurrent editors.
pub trait Store {
    /// All rows of `sheet` in stored order. A missing sheet reads as empty.
    fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>>;

    fn append_rows(&self, sheet: &str, rows: &[Row]) -> Result<()>;

    /// Clear `sheet` and write `rows` in its place.
    fn replace_all(&self, sheet: &str, rows: &[Row]) -> Result<()>;

    /// Overwrite the row at `index` (position in [`Store::read_all_rows`] order).
    fn update_row(&self, sheet: &str, index: usize, row: &[String]) -> Result<()>;

    fn append_row(&self, sheet: &str, row: &[String]) -> Result<()> {
        self.append_rows(sheet, &[row.to_vec()])
    }

    /// Write `header` into `sheet` if it holds no rows yet.
    fn ensure_header(&self, sheet: &str, header: &[String]) -> Result<()> {
        if self.read_all_rows(sheet)?.is_empty() {
            self.append_row(sheet, header)?;
        }
        Ok(())
    }
}

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sheet_rows (
    sheet TEXT NOT NULL,
    position INTEGER NOT NULL,
    cells TEXT NOT NULL,
    PRIMARY KEY (sheet, position)
);
";

/// SQLite-backed workbook. One connection per process.
pub struct SqliteStore {
    conn: Connection,
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> CaixaError {
    CaixaError::StoreUnavailable {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl SqliteStore {
    /// Open (creating if needed) the workbook at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(unavailable(db_path, "data directory does not exist"));
            }
        }
        let conn = Connection::open(db_path).map_err(|e| unavailable(db_path, e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| unavailable(db_path, e))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT sheet FROM sheet_rows ORDER BY sheet")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn insert_rows(conn: &Connection, sheet: &str, rows: &[Row]) -> Result<()> {
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM sheet_rows WHERE sheet = ?1",
            [sheet],
            |row| row.get(0),
        )?;
        let mut stmt =
            conn.prepare_cached("INSERT INTO sheet_rows (sheet, position, cells) VALUES (?1, ?2, ?3)")?;
        for (offset, row) in rows.iter().enumerate() {
            let cells = serde_json::to_string(row)?;
            stmt.execute(rusqlite::params![sheet, next + offset as i64, cells])?;
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT cells FROM sheet_rows WHERE sheet = ?1 ORDER BY position")?;
        let raw = stmt
            .query_map([sheet], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.iter()
            .map(|cells| Ok(serde_json::from_str::<Row>(cells)?))
            .collect()
    }

    fn append_rows(&self, sheet: &str, rows: &[Row]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        Self::insert_rows(&tx, sheet, rows)?;
        tx.commit()?;
        info!("appended {} rows to {sheet}", rows.len());
        Ok(())
    }

    fn replace_all(&self, sheet: &str, rows: &[Row]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sheet_rows WHERE sheet = ?1", [sheet])?;
        Self::insert_rows(&tx, sheet, rows)?;
        tx.commit()?;
        info!("rewrote {sheet} with {} rows", rows.len());
        Ok(())
    }

    fn update_row(&self, sheet: &str, index: usize, row: &[String]) -> Result<()> {
        let cells = serde_json::to_string(row)?;
        let changed = self.conn.execute(
            "UPDATE sheet_rows SET cells = ?1 WHERE sheet = ?2 AND position = \
             (SELECT position FROM sheet_rows WHERE sheet = ?2 ORDER BY position LIMIT 1 OFFSET ?3)",
            rusqlite::params![cells, sheet, index as i64],
        )?;
        if changed == 0 {
            return Err(CaixaError::Other(format!("row {index} not found in {sheet}")));
        }
        Ok(())
    }
}
