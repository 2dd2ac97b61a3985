use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::ingest::{ingest, Ledger};
use crate::models::{ledger_header_row, Row};
use crate::store::{Store, LEDGER_SHEET};

/// Fingerprint of the raw ledger rows, used to detect edits made elsewhere.
pub fn checksum(rows: &[Row]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        for cell in row {
            hasher.update((cell.len() as u64).to_le_bytes());
            hasher.update(cell.as_bytes());
        }
        hasher.update(u64::MAX.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

/// A normalized ledger together with the checksum of the rows it came from.
#[derive(Debug)]
pub struct LoadedLedger {
    pub ledger: Ledger,
    pub checksum: String,
}

/// Read-through cache over the ledger sheet.
///
/// The first [`ledger`](Self::ledger) call reads and normalizes the sheet;
/// later calls reuse that result until [`invalidate`](Self::invalidate).
/// The write methods invalidate on success. Writes made to the store by
/// anyone else are not seen until the cache is invalidated.
pub struct LedgerRepository<S: Store> {
    store: S,
    cache: RefCell<Option<Rc<LoadedLedger>>>,
}

impl<S: Store> LedgerRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: RefCell::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> Result<Rc<LoadedLedger>> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            debug!("ledger cache hit");
            return Ok(Rc::clone(cached));
        }
        let rows = self.store.read_all_rows(LEDGER_SHEET)?;
        let loaded = Rc::new(LoadedLedger {
            checksum: checksum(&rows),
            ledger: ingest(&rows),
        });
        debug!("ledger cache miss, loaded {} rows", loaded.ledger.len());
        *self.cache.borrow_mut() = Some(Rc::clone(&loaded));
        Ok(loaded)
    }

    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    #[cfg(test)]
    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Checksum of what the store holds right now, bypassing the cache.
    #[cfg(test)]
    pub fn current_checksum(&self) -> Result<String> {
        Ok(checksum(&self.store.read_all_rows(LEDGER_SHEET)?))
    }

    /// Append rows to the ledger, writing the header first on an empty sheet.
    pub fn append_rows(&self, rows: &[Row]) -> Result<()> {
        self.store.ensure_header(LEDGER_SHEET, &ledger_header_row())?;
        self.store.append_rows(LEDGER_SHEET, rows)?;
        self.invalidate();
        Ok(())
    }

    pub fn replace_all(&self, rows: &[Row]) -> Result<()> {
        self.store.replace_all(LEDGER_SHEET, rows)?;
        self.invalidate();
        Ok(())
    }
}
