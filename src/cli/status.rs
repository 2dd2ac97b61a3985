use crate::error::Result;
use crate::fmt::format_bytes;
use crate::period::{available_years, default_period};
use crate::recurring::load_bills;
use crate::settings::{settings_path, Settings};
use crate::store::{Store, PLAN_SHEET};

use super::{open_repo, today};

pub fn run(settings: &Settings) -> Result<()> {
    let db_path = settings.db_path();

    println!("Settings:   {}", settings_path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Members:    {}", settings.members.join(", "));

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `caixa init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let ledger = &loaded.ledger;
    let period = default_period(ledger, today());
    let years: Vec<String> = available_years(ledger, period)
        .iter()
        .map(|y| y.to_string())
        .collect();
    let bills = load_bills(repo.store())?.len();
    // first row of the plan sheet is its header
    let plans = repo.store().read_all_rows(PLAN_SHEET)?.len().saturating_sub(1);

    println!();
    println!("Rows:          {}", ledger.len());
    println!("Bad dates:     {}", ledger.unparsed_dates);
    println!("Bad amounts:   {}", ledger.unparsed_amounts);
    println!("Bills:         {bills}");
    println!("Plans:         {plans}");
    println!("Period:        {} ({})", period, period.name());
    println!("Years:         {}", years.join(", "));
    println!("Sheets:        {}", repo.store().sheet_names()?.join(", "));
    if ledger.is_empty() {
        println!();
        println!("The ledger is empty. Record entries with `caixa add` or load a sheet with `caixa import`.");
    }
    Ok(())
}
