use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::{CaixaError, Result};
use crate::ingest::Ledger;
use crate::models::{Kind, Transaction};

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

/// A reporting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    start: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|start| Self { start })
            .ok_or_else(|| CaixaError::InvalidPeriod(format!("{year:04}-{month:02}")))
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            start: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start
    }

    pub fn last_day(&self) -> NaiveDate {
        self.start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Long name, e.g. "Janeiro/2024".
    pub fn name(&self) -> String {
        format!("{}/{}", MONTH_NAMES[self.start.month0() as usize], self.year())
    }
}

/// `MM/YYYY`, the label used on reports.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month(), self.year())
    }
}

/// Accepts `YYYY-MM` and `MM/YYYY`.
impl FromStr for Period {
    type Err = CaixaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || CaixaError::InvalidPeriod(s.to_string());
        let (year, month) = if let Some((y, m)) = s.split_once('-') {
            (y, m)
        } else if let Some((m, y)) = s.split_once('/') {
            (y, m)
        } else {
            return Err(invalid());
        };
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

/// Reporting month to open by default.
///
/// The month of the latest date not after `today`; failing that, the month
/// of the latest date at all (a ledger holding only scheduled entries);
/// failing that, the month of `today`.
pub fn default_period(ledger: &Ledger, today: NaiveDate) -> Period {
    let dates = || ledger.iter().filter_map(|t| t.date);
    dates()
        .filter(|d| *d <= today)
        .max()
        .or_else(|| dates().max())
        .map(Period::of)
        .unwrap_or_else(|| Period::of(today))
}

/// Years with dated rows, newest first, always including `default`'s year.
pub fn available_years(ledger: &Ledger, default: Period) -> Vec<i32> {
    let mut years: Vec<i32> = ledger.iter().filter_map(|t| t.date.map(|d| d.year())).collect();
    years.push(default.year());
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Rows of one period, split by kind. Rows without a date never appear.
#[derive(Debug, Clone)]
pub struct PeriodSlice<'a> {
    pub period: Period,
    pub rows: Vec<&'a Transaction>,
    pub income: Vec<&'a Transaction>,
    pub expense: Vec<&'a Transaction>,
    pub balance: Vec<&'a Transaction>,
}

pub fn select_period(ledger: &Ledger, period: Period) -> PeriodSlice<'_> {
    let rows: Vec<&Transaction> = ledger
        .iter()
        .filter(|t| t.date.is_some_and(|d| period.contains(d)))
        .collect();
    let pick = |kind: Kind| rows.iter().copied().filter(|t| t.is(kind)).collect::<Vec<_>>();
    PeriodSlice {
        period,
        income: pick(Kind::Income),
        expense: pick(Kind::Expense),
        balance: pick(Kind::Balance),
        rows,
    }
}
