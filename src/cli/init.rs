use std::path::PathBuf;

use crate::error::Result;
use crate::models::ledger_header_row;
use crate::settings::{save_settings, Settings};
use crate::store::{SqliteStore, Store, LEDGER_SHEET};

pub fn run(settings: &Settings) -> Result<()> {
    save_settings(settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let store = SqliteStore::open(&settings.db_path())?;
    store.ensure_header(LEDGER_SHEET, &ledger_header_row())?;

    println!("Initialized caixa at {}", resolved.display());
    Ok(())
}
