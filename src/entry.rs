use chrono::{Months, NaiveDate};
use log::info;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::dates::format_date;
use crate::error::{CaixaError, Result};
use crate::models::{
    Kind, Row, BALANCE_CATEGORY, CARD_PAYMENT_CATEGORY, CARD_PAYMENT_METHOD, CREDIT_CARD_METHOD,
    SYSTEM_RESPONSIBLE,
};
use crate::repository::LedgerRepository;
use crate::store::Store;

pub const MAX_INSTALLMENTS: u32 = 36;

/// A transaction typed in by the user, before it becomes ledger rows.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub responsible: String,
    pub kind: Option<Kind>,
    pub description: String,
    pub category: String,
    pub method: String,
    pub amount: Decimal,
    pub installments: u32,
}

fn stored_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

impl NewEntry {
    /// Names of the required fields left empty, in form order.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.responsible.trim().is_empty() {
            missing.push("responsible");
        }
        if self.kind.is_none() {
            missing.push("kind");
        }
        if self.category.trim().is_empty() && self.kind != Some(Kind::Transfer) {
            missing.push("category");
        }
        if self.method.trim().is_empty() && self.kind != Some(Kind::Transfer) {
            missing.push("method");
        }
        if self.amount.is_zero() {
            missing.push("amount");
        }
        missing.into_iter().map(String::from).collect()
    }

    pub fn validate(&self) -> Result<Kind> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(CaixaError::Validation(missing));
        }
        if !(1..=MAX_INSTALLMENTS).contains(&self.installments) {
            return Err(CaixaError::Other(format!(
                "installments must be between 1 and {MAX_INSTALLMENTS}, got {}",
                self.installments
            )));
        }
        self.kind
            .ok_or_else(|| CaixaError::Validation(vec!["kind".to_string()]))
    }

    /// Ledger rows for this entry. Validates first; nothing is produced on error.
    ///
    /// Credit-card purchases with more than one installment become one row
    /// per month, each carrying `(i/N)` in the description.
    pub fn to_rows(&self) -> Result<Vec<Row>> {
        let kind = self.validate()?;
        let (category, method) = if kind == Kind::Transfer {
            (CARD_PAYMENT_CATEGORY.to_string(), CARD_PAYMENT_METHOD.to_string())
        } else {
            (self.category.trim().to_string(), self.method.trim().to_string())
        };
        let amount = if kind == Kind::Income {
            self.amount.abs()
        } else {
            -self.amount.abs()
        };
        let row = |date: NaiveDate, description: String, amount: Decimal| -> Row {
            vec![
                format_date(date),
                self.responsible.trim().to_string(),
                kind.label().to_string(),
                description,
                category.clone(),
                method.clone(),
                stored_amount(amount),
            ]
        };

        let n = self.installments;
        if method == CREDIT_CARD_METHOD && n > 1 && kind != Kind::Transfer {
            let share = amount / Decimal::from(n);
            return (0..n)
                .map(|i| {
                    let date = self
                        .date
                        .checked_add_months(Months::new(i))
                        .ok_or_else(|| CaixaError::Other(format!("installment {} out of range", i + 1)))?;
                    Ok(row(date, format!("{} ({}/{n})", self.description, i + 1), share))
                })
                .collect();
        }
        Ok(vec![row(self.date, self.description.clone(), amount)])
    }
}

/// Row recording the absolute balance of `account` on `date`.
pub fn balance_snapshot_row(date: NaiveDate, account: &str, amount: Decimal) -> Result<Row> {
    let account = account.trim();
    if account.is_empty() {
        return Err(CaixaError::Validation(vec!["account".to_string()]));
    }
    Ok(vec![
        format_date(date),
        SYSTEM_RESPONSIBLE.to_string(),
        Kind::Balance.label().to_string(),
        account.to_string(),
        BALANCE_CATEGORY.to_string(),
        account.to_string(),
        stored_amount(amount),
    ])
}

/// Validate and append an entry. Returns the rows written.
pub fn record_entry<S: Store>(repo: &LedgerRepository<S>, entry: &NewEntry) -> Result<Vec<Row>> {
    let rows = entry.to_rows()?;
    repo.append_rows(&rows)?;
    info!("recorded {} row(s) for {:?}", rows.len(), entry.description);
    Ok(rows)
}

pub fn record_balance<S: Store>(
    repo: &LedgerRepository<S>,
    date: NaiveDate,
    account: &str,
    amount: Decimal,
) -> Result<Row> {
    let row = balance_snapshot_row(date, account, amount)?;
    repo.append_rows(std::slice::from_ref(&row))?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::opening_balance;
    use crate::store::{SqliteStore, LEDGER_SHEET};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(kind: Kind, method: &str, amount: &str, installments: u32) -> NewEntry {
        NewEntry {
            date: ymd(2024, 1, 31),
            responsible: "Ana".to_string(),
            kind: Some(kind),
            description: "Geladeira".to_string(),
            category: "Casa e Jardim".to_string(),
            method: method.to_string(),
            amount: dec(amount),
            installments,
        }
    }

    #[test]
    fn test_expense_is_stored_negative() {
        let rows = entry(Kind::Expense, "Pix", "150", 1).to_rows().unwrap();
        assert_eq!(
            rows,
            vec![vec!["31/01/2024", "Ana", "Despesa", "Geladeira", "Casa e Jardim", "Pix", "-150.00"]]
        );
    }

    #[test]
    fn test_income_is_stored_positive() {
        let rows = entry(Kind::Income, "Pix", "-2500.5", 1).to_rows().unwrap();
        assert_eq!(rows[0][6], "2500.50");
    }

    #[test]
    fn test_transfer_forces_card_payment_fields() {
        let mut e = entry(Kind::Transfer, "", "300", 5);
        e.category = String::new();
        let rows = e.to_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][4], CARD_PAYMENT_CATEGORY);
        assert_eq!(rows[0][5], CARD_PAYMENT_METHOD);
        assert_eq!(rows[0][6], "-300.00");
    }

    #[test]
    fn test_installments_split_across_months() {
        let rows = entry(Kind::Expense, CREDIT_CARD_METHOD, "100", 3).to_rows().unwrap();
        assert_eq!(rows.len(), 3);
        let dates: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(dates, vec!["31/01/2024", "29/02/2024", "31/03/2024"]);
        assert_eq!(rows[0][3], "Geladeira (1/3)");
        assert_eq!(rows[2][3], "Geladeira (3/3)");
        assert!(rows.iter().all(|r| r[6] == "-33.33"));
    }

    #[test]
    fn test_installments_ignored_off_card() {
        let rows = entry(Kind::Expense, "Pix", "100", 3).to_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "Geladeira");
    }

    #[test]
    fn test_validation_lists_missing_fields() {
        let mut e = entry(Kind::Expense, "", "0", 1);
        e.responsible = " ".to_string();
        e.category = String::new();
        match e.to_rows() {
            Err(CaixaError::Validation(fields)) => {
                assert_eq!(fields, vec!["responsible", "category", "method", "amount"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let mut e = entry(Kind::Expense, "Pix", "10", 1);
        e.kind = None;
        assert!(matches!(e.validate(), Err(CaixaError::Validation(_))));
    }

    #[test]
    fn test_installment_bounds() {
        assert!(entry(Kind::Expense, CREDIT_CARD_METHOD, "10", 0).to_rows().is_err());
        assert!(entry(Kind::Expense, CREDIT_CARD_METHOD, "10", 37).to_rows().is_err());
        assert_eq!(entry(Kind::Expense, CREDIT_CARD_METHOD, "10", 36).to_rows().unwrap().len(), 36);
    }

    #[test]
    fn test_snapshot_row_shape() {
        let row = balance_snapshot_row(ymd(2024, 1, 31), " Banco Inter ", dec("1234.5")).unwrap();
        assert_eq!(
            row,
            vec!["31/01/2024", "Sistema", "Saldo", "Banco Inter", "Saldo", "Banco Inter", "1234.50"]
        );
        assert!(balance_snapshot_row(ymd(2024, 1, 31), "  ", dec("1")).is_err());
    }

    #[test]
    fn test_record_entry_and_balance_round_trip() {
        let repo = LedgerRepository::new(SqliteStore::open_in_memory().unwrap());
        record_entry(&repo, &entry(Kind::Expense, "Pix", "10", 1)).unwrap();
        record_balance(&repo, ymd(2024, 1, 31), "BankA", dec("900")).unwrap();

        let loaded = repo.ledger().unwrap();
        assert_eq!(loaded.ledger.len(), 2);
        assert_eq!(opening_balance(&loaded.ledger, ymd(2024, 2, 1)), dec("900"));
        assert_eq!(repo.store().read_all_rows(LEDGER_SHEET).unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_entry_writes_nothing() {
        let repo = LedgerRepository::new(SqliteStore::open_in_memory().unwrap());
        let mut e = entry(Kind::Expense, "Pix", "10", 1);
        e.responsible.clear();
        assert!(record_entry(&repo, &e).is_err());
        assert!(repo.store().read_all_rows(LEDGER_SHEET).unwrap().is_empty());
    }
}
