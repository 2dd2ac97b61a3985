use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;

use crate::dates::format_date;
use crate::error::{CaixaError, Result};
use crate::fmt::money;
use crate::ingest::Ledger;
use crate::models::{Kind, Row, Transaction};
use crate::period::{select_period, Period};
use crate::repository::LedgerRepository;
use crate::store::{Store, BILLS_SHEET};
use crate::value::parse_money;

pub const BILLS_HEADER: [&str; 5] = ["Descrição", "Valor padrão", "Dia", "Categoria", "Responsável"];

/// Days past 28 are pulled back so every month has the due date.
const LAST_SAFE_DAY: u32 = 28;

/// A bill paid every month, kept on its own worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringBill {
    pub description: String,
    pub default_amount: Option<Decimal>,
    pub due_day: u32,
    pub category: String,
    pub responsible: String,
}

fn bill_key(description: &str, category: &str, responsible: &str) -> String {
    format!("{}|{}|{}", description.trim(), category.trim(), responsible.trim())
}

impl RecurringBill {
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            description: cell(0),
            default_amount: parse_money(&cell(1)),
            due_day: cell(2)
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 1.0)
                .map(|d| d as u32)
                .unwrap_or(1),
            category: cell(3),
            responsible: cell(4),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.description.clone(),
            self.default_amount.map(|a| format!("{a:.2}")).unwrap_or_default(),
            self.due_day.to_string(),
            self.category.clone(),
            self.responsible.clone(),
        ]
    }

    pub fn key(&self) -> String {
        bill_key(&self.description, &self.category, &self.responsible)
    }

    pub fn due_date(&self, period: Period) -> NaiveDate {
        let day = self.due_day.clamp(1, LAST_SAFE_DAY);
        NaiveDate::from_ymd_opt(period.year(), period.month(), day).unwrap_or(period.first_day())
    }

    /// An Expense row of `period` with the same description, category and responsible.
    fn is_paid_by(&self, t: &Transaction) -> bool {
        t.is(Kind::Expense) && bill_key(&t.description, &t.category, &t.responsible) == self.key()
    }

    pub fn is_paid(&self, ledger: &Ledger, period: Period) -> bool {
        select_period(ledger, period).expense.iter().any(|t| self.is_paid_by(t))
    }

    /// Default amount for display, "-" when the sheet left it blank.
    pub fn default_amount_label(&self) -> String {
        self.default_amount
            .map(money)
            .unwrap_or_else(|| "-".to_string())
    }
}

pub fn load_bills<S: Store>(store: &S) -> Result<Vec<RecurringBill>> {
    Ok(store
        .read_all_rows(BILLS_SHEET)?
        .iter()
        .skip(1)
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
        .map(|r| RecurringBill::from_row(r))
        .collect())
}

pub fn register_bill<S: Store>(store: &S, bill: &RecurringBill) -> Result<()> {
    let mut missing = Vec::new();
    if bill.description.trim().is_empty() {
        missing.push("description".to_string());
    }
    if bill.responsible.trim().is_empty() {
        missing.push("responsible".to_string());
    }
    if !missing.is_empty() {
        return Err(CaixaError::Validation(missing));
    }
    if !(1..=31).contains(&bill.due_day) {
        return Err(CaixaError::Other(format!(
            "due day must be between 1 and 31, got {}",
            bill.due_day
        )));
    }
    let header: Row = BILLS_HEADER.iter().map(|s| s.to_string()).collect();
    store.ensure_header(BILLS_SHEET, &header)?;
    store.append_row(BILLS_SHEET, &bill.to_row())?;
    info!("registered recurring bill {:?}", bill.description);
    Ok(())
}

/// A bill not yet paid in the period, with its due date there.
#[derive(Debug, Clone)]
pub struct PendingBill {
    pub bill: RecurringBill,
    pub due: NaiveDate,
}

pub fn pending_bills(bills: &[RecurringBill], ledger: &Ledger, period: Period) -> Vec<PendingBill> {
    let slice = select_period(ledger, period);
    bills
        .iter()
        .filter(|b| !slice.expense.iter().any(|t| b.is_paid_by(t)))
        .map(|b| PendingBill {
            bill: b.clone(),
            due: b.due_date(period),
        })
        .collect()
}

/// Post one payment of `bill` in `period`.
///
/// The payment is dated `today` when `today` falls in `period`, otherwise at
/// the bill's due date in `period`, so the posting always lands in the
/// period the duplicate check looked at.
///
/// Fails with [`CaixaError::DuplicatePayment`] when the period already holds
/// a matching Expense row; nothing is written in that case.
pub fn pay_bill<S: Store>(
    repo: &LedgerRepository<S>,
    bill: &RecurringBill,
    period: Period,
    amount: Decimal,
    method: &str,
    today: NaiveDate,
) -> Result<Row> {
    let mut missing = Vec::new();
    if amount <= Decimal::ZERO {
        missing.push("amount".to_string());
    }
    if method.trim().is_empty() {
        missing.push("method".to_string());
    }
    if !missing.is_empty() {
        return Err(CaixaError::Validation(missing));
    }
    if bill.is_paid(&repo.ledger()?.ledger, period) {
        warn!("{} already paid in {period}", bill.description);
        return Err(CaixaError::DuplicatePayment(bill.description.clone()));
    }
    let date = if period.contains(today) {
        today
    } else {
        bill.due_date(period)
    };
    let row = vec![
        format_date(date),
        bill.responsible.clone(),
        Kind::Expense.label().to_string(),
        bill.description.clone(),
        bill.category.clone(),
        method.trim().to_string(),
        format!("{:.2}", -amount.abs()),
    ];
    repo.append_rows(std::slice::from_ref(&row))?;
    Ok(row)
}
