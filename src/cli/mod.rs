pub mod add;
pub mod backup;
pub mod bills;
pub mod edit;
pub mod import;
pub mod init;
pub mod plan;
pub mod report;
pub mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::dates::parse_date;
use crate::error::{CaixaError, Result};
use crate::ingest::Ledger;
use crate::period::{default_period, Period};
use crate::repository::LedgerRepository;
use crate::settings::{load_settings, shellexpand_path, Settings};
use crate::store::SqliteStore;
use crate::value::parse_money;

pub(crate) type Repo = LedgerRepository<SqliteStore>;

/// Settings for this invocation, with `--data-dir` applied.
pub(crate) fn resolve_settings(data_dir: Option<&str>) -> Settings {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(dir);
    }
    settings
}

pub(crate) fn open_repo(settings: &Settings) -> Result<Repo> {
    Ok(LedgerRepository::new(SqliteStore::open(&settings.db_path())?))
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// `--month` when given, otherwise the default reporting month of the ledger.
pub(crate) fn resolve_period(ledger: &Ledger, month: Option<&str>) -> Result<Period> {
    match month {
        Some(m) => m.parse(),
        None => Ok(default_period(ledger, today())),
    }
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| CaixaError::Other(format!("Invalid date: {raw} (expected DD/MM/YYYY)")))
}

pub(crate) fn parse_amount_arg(raw: &str) -> Result<rust_decimal::Decimal> {
    parse_money(raw).ok_or_else(|| CaixaError::Other(format!("Invalid amount: {raw}")))
}

#[derive(Parser)]
#[command(name = "caixa", version, about = "Household cash ledger: monthly balances, card invoices and budgets.")]
pub struct Cli {
    /// Data directory holding caixa.db (overrides settings.json)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up caixa: create the data directory and the ledger.
    Init,
    /// Show the data location and a summary of the ledger.
    Status,
    /// Record a transaction.
    Add {
        /// Kind: Despesa, Receita or Transferência
        #[arg(long)]
        kind: String,
        /// Amount, e.g. 1.234,56
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Payment or receiving method
        #[arg(long, default_value = "")]
        method: String,
        /// Who the entry belongs to
        #[arg(long)]
        responsible: String,
        /// Date: DD/MM/YYYY (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Credit-card installments (1 = paid at once)
        #[arg(long, default_value = "1")]
        installments: u32,
    },
    /// Record the balance of an account.
    Snapshot {
        /// Account name
        account: String,
        /// Balance, e.g. 1.234,56
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Date: DD/MM/YYYY (default: last day of the month)
        #[arg(long)]
        date: Option<String>,
        /// Month: YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Manage recurring monthly bills.
    Bills {
        #[command(subcommand)]
        command: BillsCommands,
    },
    /// Monthly budget planning.
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Edit a whole month as CSV.
    Edit {
        #[command(subcommand)]
        command: EditCommands,
    },
    /// Import rows from a CSV/XLSX file into the ledger.
    Import {
        /// Path to CSV or XLSX file to import
        file: String,
        /// Replace the ledger instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/caixa-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Balances and expense breakdowns for a month.
    Overview {
        /// Month: YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
    /// Income breakdowns for a month.
    Income {
        #[arg(long)]
        month: Option<String>,
    },
    /// Rows of a month, filtered.
    Detail {
        #[arg(long)]
        month: Option<String>,
        /// Kind filter (repeatable)
        #[arg(long = "kind")]
        kinds: Vec<String>,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "responsible")]
        responsible: Vec<String>,
        #[arg(long = "method")]
        methods: Vec<String>,
        /// Text to look for in description, category or responsible
        #[arg(long)]
        search: Option<String>,
    },
    /// Credit-card invoice for a date range.
    Invoice {
        #[arg(long)]
        month: Option<String>,
        /// Start date: DD/MM/YYYY (default: first day of the month)
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: DD/MM/YYYY (default: last day of the month)
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Card method label, e.g. "Cartão de Crédito Nubank"
        #[arg(long)]
        card: Option<String>,
        /// Do not subtract refunds
        #[arg(long = "no-credits")]
        no_credits: bool,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "responsible")]
        responsible: Vec<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Rows dated after today, such as future installments.
    Upcoming,
}

#[derive(Subcommand)]
pub enum BillsCommands {
    /// List bills and whether they are paid this month.
    List {
        #[arg(long)]
        month: Option<String>,
    },
    /// Register a recurring bill.
    Add {
        description: String,
        /// Day of the month it is due (1-31)
        #[arg(long = "due-day")]
        due_day: u32,
        #[arg(long)]
        category: String,
        #[arg(long)]
        responsible: String,
        /// Usual amount, e.g. 99,90
        #[arg(long)]
        amount: Option<String>,
    },
    /// Post the payment of a bill (dated today, or at its due date for another month).
    Pay {
        /// Bill description
        description: String,
        /// Amount paid (default: the bill's usual amount)
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        method: String,
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show the plan of a month against actual spending.
    Show {
        #[arg(long)]
        month: Option<String>,
    },
    /// Create or update the plan of a month.
    Set {
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "salary-a")]
        salary_a: Option<String>,
        #[arg(long = "salary-b")]
        salary_b: Option<String>,
        #[arg(long)]
        extras: Option<String>,
        #[arg(long)]
        investments: Option<String>,
        /// Category budget as CATEGORY=AMOUNT (repeatable)
        #[arg(long = "budget")]
        budget: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum EditCommands {
    /// Write a month to CSV for editing.
    Export {
        #[arg(long)]
        month: Option<String>,
        /// Output path (default: <data_dir>/exports/caixa-YYYY-MM.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Replace a month with an edited export.
    Save {
        /// Edited CSV file
        file: String,
        /// Month the file must belong to (default: the month it was exported for)
        #[arg(long)]
        month: Option<String>,
    },
}

pub(crate) fn default_export_path(settings: &Settings, period: Period) -> PathBuf {
    PathBuf::from(&settings.data_dir)
        .join("exports")
        .join(format!("caixa-{:04}-{:02}.csv", period.year(), period.month()))
}
