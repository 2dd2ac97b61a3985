use colored::Colorize;

use crate::entry::{record_balance, record_entry, NewEntry};
use crate::error::{CaixaError, Result};
use crate::fmt::money_cell;
use crate::models::{Kind, EXPENSE_CATEGORIES, INCOME_CATEGORIES, METHODS};
use crate::settings::Settings;

use super::{open_repo, parse_amount_arg, parse_date_arg, resolve_period, today};

pub struct AddArgs {
    pub kind: String,
    pub amount: String,
    pub description: String,
    pub category: String,
    pub method: String,
    pub responsible: String,
    pub date: Option<String>,
    pub installments: u32,
}

pub fn run(settings: &Settings, args: AddArgs) -> Result<()> {
    let kind = Kind::parse(&args.kind).filter(|k| *k != Kind::Balance);
    if kind.is_none() {
        return Err(CaixaError::Other(format!(
            "Unknown kind: {} (use Despesa, Receita or Transferência)",
            args.kind
        )));
    }
    if !settings.members.iter().any(|m| m == args.responsible.trim()) {
        log::warn!("{} is not a configured member", args.responsible);
    }
    let categories = match kind {
        Some(Kind::Income) => INCOME_CATEGORIES,
        _ => EXPENSE_CATEGORIES,
    };
    if kind != Some(Kind::Transfer) {
        if !categories.contains(&args.category.trim()) {
            log::info!("new category: {}", args.category);
        }
        if !METHODS.contains(&args.method.trim()) {
            log::info!("new method: {}", args.method);
        }
    }
    let entry = NewEntry {
        date: match args.date.as_deref() {
            Some(d) => parse_date_arg(d)?,
            None => today(),
        },
        responsible: args.responsible,
        kind,
        description: args.description,
        category: args.category,
        method: args.method,
        amount: parse_amount_arg(&args.amount)?,
        installments: args.installments,
    };

    let repo = open_repo(settings)?;
    let rows = record_entry(&repo, &entry)?;
    for row in &rows {
        println!(
            "{} {}  {}  {}",
            "+".green(),
            row[0],
            row[3],
            money_cell(&row[6])
        );
    }
    println!("{} row(s) saved.", rows.len());
    Ok(())
}

pub fn snapshot(
    settings: &Settings,
    account: &str,
    amount: &str,
    date: Option<&str>,
    month: Option<&str>,
) -> Result<()> {
    let amount = parse_amount_arg(amount)?;
    let repo = open_repo(settings)?;
    let date = match date {
        Some(d) => parse_date_arg(d)?,
        None => resolve_period(&repo.ledger()?.ledger, month)?.last_day(),
    };
    if !settings.accounts.iter().any(|a| a == account.trim()) {
        log::info!("{account} is not a configured account");
    }
    let row = record_balance(&repo, date, account, amount)?;
    println!("Balance of {} on {}: {}", row[3], row[0], money_cell(&row[6]));
    Ok(())
}
