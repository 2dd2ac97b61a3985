use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ingest::Ledger;
use crate::models::{Kind, Transaction, CARD_PAYMENT_CATEGORY};
use crate::period::{select_period, Period};
use crate::text::normalize_text;

/// Cash position of one period.
///
/// Expenses are recognized when incurred (accrual), so card purchases count
/// in `expense` the month they happen. `card_cash_out` is the money that
/// actually left the bank to pay card bills; the cash figures subtract it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodBalances {
    pub opening: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
    pub period_result: Decimal,
    pub closing: Decimal,
    pub card_cash_out: Decimal,
    pub cash_variation: Decimal,
    pub closing_cash: Decimal,
    /// Sum of balance snapshots dated inside the period, if any.
    pub declared: Option<Decimal>,
}

/// Snapshot identity: the normalized account name in the description.
pub fn account_key(description: &str) -> String {
    normalize_text(description)
}

/// Latest snapshot per account dated on or before `as_of`, summed.
///
/// A snapshot taken on the first day of a month is that month's opening
/// position, so the bound is inclusive rather than strictly before the
/// period start: a ledger whose only January snapshot is dated 01/01 opens
/// January with it. Ties on date go to the row stored last.
pub fn opening_balance(ledger: &Ledger, as_of: NaiveDate) -> Decimal {
    let mut latest: HashMap<String, (NaiveDate, Decimal)> = HashMap::new();
    for t in ledger.iter().filter(|t| t.is(Kind::Balance)) {
        let Some(date) = t.date.filter(|d| *d <= as_of) else {
            continue;
        };
        let key = account_key(&t.description);
        match latest.get(&key) {
            Some((seen, _)) if *seen > date => {}
            _ => {
                latest.insert(key, (date, t.value()));
            }
        }
    }
    latest.values().map(|(_, v)| *v).sum()
}

fn is_card_payment(t: &Transaction) -> bool {
    t.is(Kind::Transfer) && t.category.trim() == CARD_PAYMENT_CATEGORY
}

pub fn compute_balances(ledger: &Ledger, period: Period) -> PeriodBalances {
    let slice = select_period(ledger, period);
    let opening = opening_balance(ledger, period.first_day());

    let income: Decimal = slice.income.iter().map(|t| t.value()).sum();
    let expense: Decimal = slice.expense.iter().map(|t| t.value().abs()).sum();
    let card_cash_out: Decimal = slice
        .rows
        .iter()
        .filter(|t| is_card_payment(t))
        .map(|t| t.value().abs())
        .sum();
    let declared = (!slice.balance.is_empty())
        .then(|| slice.balance.iter().map(|t| t.value()).sum());

    let period_result = income - expense;
    let cash_variation = period_result - card_cash_out;
    PeriodBalances {
        opening,
        income,
        expense,
        period_result,
        closing: opening + period_result,
        card_cash_out,
        cash_variation,
        closing_cash: opening + cash_variation,
        declared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
    use crate::models::{ledger_header_row, Row};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(date: &str, kind: &str, desc: &str, category: &str, method: &str, amount: &str) -> Row {
        [date, "Ana", kind, desc, category, method, amount]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn ledger(rows: Vec<Row>) -> Ledger {
        let mut raw = vec![ledger_header_row()];
        raw.extend(rows);
        ingest(&raw)
    }

    fn jan() -> Period {
        Period::new(2024, 1).unwrap()
    }

    #[test]
    fn test_end_to_end_card_scenario() {
        let l = ledger(vec![
            row("05/01/2024", "Despesa", "Mercado", "Supermercado", "Cartão de Crédito", "150,00"),
            row("01/01/2024", "Saldo", "BankA", "Saldo", "BankA", "1000,00"),
            row("10/01/2024", "Transferência", "Fatura", "Pagamento Cartão", "Transferência Bancária", "150,00"),
        ]);
        let b = compute_balances(&l, jan());
        assert_eq!(b.opening, dec("1000.00"));
        assert_eq!(b.expense, dec("150.00"));
        assert_eq!(b.income, Decimal::ZERO);
        assert_eq!(b.period_result, dec("-150.00"));
        assert_eq!(b.card_cash_out, dec("150.00"));
        assert_eq!(b.cash_variation, dec("0.00"));
        assert_eq!(b.closing_cash, dec("1000.00"));
        assert_eq!(b.closing, dec("850.00"));
        assert_eq!(b.declared, Some(dec("1000.00")));
    }

    #[test]
    fn test_opening_uses_latest_snapshot_per_account() {
        let l = ledger(vec![
            row("01/11/2023", "Saldo", "BankA", "Saldo", "BankA", "500"),
            row("01/12/2023", "Saldo", "BankA", "Saldo", "BankA", "700"),
            row("15/12/2023", "Saldo", "Banco Inter", "Saldo", "Banco Inter", "300"),
            row("15/11/2023", "Saldo", "banco  inter", "Saldo", "Banco Inter", "999"),
        ]);
        assert_eq!(opening_balance(&l, jan().first_day()), dec("1000"));
    }

    #[test]
    fn test_opening_tie_breaks_by_row_order() {
        let l = ledger(vec![
            row("01/12/2023", "Saldo", "BankA", "Saldo", "BankA", "100"),
            row("01/12/2023", "Saldo", "BankA", "Saldo", "BankA", "250"),
        ]);
        assert_eq!(opening_balance(&l, jan().first_day()), dec("250"));
    }

    #[test]
    fn test_opening_counts_snapshot_on_first_day() {
        let l = ledger(vec![
            row("31/12/2023", "Saldo", "BankA", "Saldo", "BankA", "400"),
            row("01/01/2024", "Saldo", "BankA", "Saldo", "BankA", "1000"),
        ]);
        assert_eq!(opening_balance(&l, jan().first_day()), dec("1000"));
        let dec_2023 = Period::new(2023, 12).unwrap();
        assert_eq!(opening_balance(&l, dec_2023.first_day()), Decimal::ZERO);
    }

    #[test]
    fn test_opening_ignores_snapshots_after_period_start() {
        let l = ledger(vec![
            row("02/01/2024", "Saldo", "BankA", "Saldo", "BankA", "100"),
            row("20/02/2024", "Saldo", "BankB", "Saldo", "BankB", "100"),
        ]);
        assert_eq!(opening_balance(&l, jan().first_day()), Decimal::ZERO);
        let b = compute_balances(&l, jan());
        assert_eq!(b.opening, Decimal::ZERO);
        assert_eq!(b.closing, Decimal::ZERO);
        assert_eq!(b.declared, Some(dec("100")));
    }

    #[test]
    fn test_account_without_prior_snapshot_contributes_zero() {
        let l = ledger(vec![
            row("01/12/2023", "Saldo", "BankA", "Saldo", "BankA", "400"),
            row("05/01/2024", "Saldo", "BankB", "Saldo", "BankB", "9000"),
        ]);
        assert_eq!(compute_balances(&l, jan()).opening, dec("400"));
    }

    #[test]
    fn test_only_card_payment_transfers_are_cash_out() {
        let l = ledger(vec![
            row("03/01/2024", "Transferência", "Fatura", " Pagamento Cartão ", "Pix", "80"),
            row("04/01/2024", "Transferência", "Poupança", "Investimento", "Pix", "500"),
            row("04/02/2024", "Transferência", "Fatura", "Pagamento Cartão", "Pix", "70"),
        ]);
        let b = compute_balances(&l, jan());
        assert_eq!(b.card_cash_out, dec("80"));
        assert_eq!(b.expense, Decimal::ZERO);
    }

    #[test]
    fn test_missing_amounts_count_as_zero() {
        let l = ledger(vec![
            row("03/01/2024", "Despesa", "A", "Lazer", "Pix", "abc"),
            row("04/01/2024", "Despesa", "B", "Lazer", "Pix", "20"),
            row("05/01/2024", "Receita", "C", "Salário", "Pix", ""),
        ]);
        let b = compute_balances(&l, jan());
        assert_eq!(b.expense, dec("20"));
        assert_eq!(b.income, Decimal::ZERO);
    }

    #[test]
    fn test_closing_minus_closing_cash_is_card_cash_out() {
        let l = ledger(vec![
            row("30/12/2023", "Saldo", "BankA", "Saldo", "BankA", "1.234,56"),
            row("02/01/2024", "Receita", "Salário", "Salário", "Crédito em Conta", "5.000,00"),
            row("03/01/2024", "Despesa", "Mercado", "Supermercado", "Cartão de Crédito", "333,33"),
            row("04/01/2024", "Despesa", "Luz", "Moradia", "Pix", "0,10"),
            row("09/01/2024", "Transferência", "Fatura", "Pagamento Cartão", "Pix", "1.111,11"),
            row("19/01/2024", "Transferência", "Fatura", "Pagamento Cartão", "Pix", "0,20"),
        ]);
        let b = compute_balances(&l, jan());
        assert_eq!(b.closing - b.closing_cash, b.card_cash_out);
        assert_eq!(b.card_cash_out, dec("1111.31"));
        assert_eq!(b.period_result, dec("4666.57"));
    }
}
