use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::balance::{compute_balances, PeriodBalances};
use crate::ingest::Ledger;
use crate::models::{Kind, Transaction};
use crate::period::{select_period, Period};
use crate::text::normalize_text;

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownItem {
    pub name: String,
    /// Magnitude of the group's sum.
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Category,
    Method,
    Responsible,
}

impl GroupBy {
    fn key<'t>(&self, t: &'t Transaction) -> &'t str {
        match self {
            Self::Category => &t.category,
            Self::Method => &t.method,
            Self::Responsible => &t.responsible,
        }
    }
}

/// Group `rows`, largest total first. Ties sort by name.
pub fn breakdown<'a>(rows: impl IntoIterator<Item = &'a Transaction>, by: GroupBy) -> Vec<BreakdownItem> {
    let mut groups: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for t in rows {
        let entry = groups.entry(by.key(t)).or_default();
        entry.0 += t.value();
        entry.1 += 1;
    }
    let mut items: Vec<BreakdownItem> = groups
        .into_iter()
        .map(|(name, (sum, count))| BreakdownItem {
            name: name.to_string(),
            total: sum.abs(),
            count,
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    items
}

#[derive(Debug, Clone)]
pub struct Breakdowns {
    pub total: Decimal,
    pub count: usize,
    pub by_category: Vec<BreakdownItem>,
    pub by_method: Vec<BreakdownItem>,
    pub by_responsible: Vec<BreakdownItem>,
}

impl Breakdowns {
    pub fn of(rows: &[&Transaction]) -> Self {
        Self {
            total: rows.iter().map(|t| t.value()).sum::<Decimal>().abs(),
            count: rows.len(),
            by_category: breakdown(rows.iter().copied(), GroupBy::Category),
            by_method: breakdown(rows.iter().copied(), GroupBy::Method),
            by_responsible: breakdown(rows.iter().copied(), GroupBy::Responsible),
        }
    }
}

// ---------------------------------------------------------------------------
// Overview & income
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Overview {
    pub period: Period,
    pub balances: PeriodBalances,
    pub rows: usize,
    pub expenses: Breakdowns,
}

pub fn get_overview(ledger: &Ledger, period: Period) -> Overview {
    let slice = select_period(ledger, period);
    Overview {
        period: slice.period,
        balances: compute_balances(ledger, period),
        rows: slice.rows.len(),
        expenses: Breakdowns::of(&slice.expense),
    }
}

pub fn get_income(ledger: &Ledger, period: Period) -> Breakdowns {
    Breakdowns::of(&select_period(ledger, period).income)
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// Row filter. Empty lists match everything.
#[derive(Debug, Clone, Default)]
pub struct DetailFilter {
    pub kinds: Vec<Kind>,
    pub categories: Vec<String>,
    pub responsible: Vec<String>,
    pub methods: Vec<String>,
    /// Accent- and case-insensitive substring of description, category or responsible.
    pub search: Option<String>,
}

fn listed(values: &[String], value: &str) -> bool {
    values.is_empty() || values.iter().any(|v| v.trim() == value.trim())
}

impl DetailFilter {
    pub fn is_active(&self) -> bool {
        !(self.kinds.is_empty()
            && self.categories.is_empty()
            && self.responsible.is_empty()
            && self.methods.is_empty()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if !self.kinds.is_empty() && !t.kind.is_some_and(|k| self.kinds.contains(&k)) {
            return false;
        }
        if !listed(&self.categories, &t.category)
            || !listed(&self.responsible, &t.responsible)
            || !listed(&self.methods, &t.method)
        {
            return false;
        }
        match self.search.as_deref().map(normalize_text) {
            Some(needle) if !needle.is_empty() => [&t.description, &t.category, &t.responsible]
                .iter()
                .any(|field| normalize_text(field).contains(&needle)),
            _ => true,
        }
    }
}

pub fn get_detail<'a>(ledger: &'a Ledger, period: Period, filter: &DetailFilter) -> Vec<&'a Transaction> {
    select_period(ledger, period)
        .rows
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect()
}

// ---------------------------------------------------------------------------
// Card invoice
// ---------------------------------------------------------------------------

fn credit_card_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bcartao\s*de\s*credito\b").expect("static regex"))
}

/// Whether a payment method names a credit card, e.g. "Cartão de Crédito Nubank".
pub fn is_credit_card(method: &str) -> bool {
    credit_card_pattern().is_match(&normalize_text(method))
}

/// Distinct credit-card method labels in the ledger, sorted.
pub fn card_methods(ledger: &Ledger) -> Vec<String> {
    ledger
        .iter()
        .filter(|t| is_credit_card(&t.method))
        .map(|t| t.method.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone)]
pub struct InvoiceQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Restrict to one card method label; `None` takes every card.
    pub card: Option<String>,
    pub include_credits: bool,
    /// Only the category, responsible and search parts apply.
    pub filter: DetailFilter,
}

impl InvoiceQuery {
    pub fn for_period(period: Period) -> Self {
        Self {
            from: period.first_day(),
            to: period.last_day(),
            card: None,
            include_credits: true,
            filter: DetailFilter::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Invoice<'a> {
    pub expenses: Vec<&'a Transaction>,
    pub credits: Vec<&'a Transaction>,
    pub spent: Decimal,
    pub credited: Decimal,
    /// `spent - credited`, never below zero.
    pub total: Decimal,
    pub by_category: Vec<BreakdownItem>,
}

fn is_refund(t: &Transaction) -> bool {
    t.is(Kind::Income) && matches!(normalize_text(&t.category).as_str(), "estorno" | "estornos")
}

pub fn card_invoice<'a>(ledger: &'a Ledger, query: &InvoiceQuery) -> Invoice<'a> {
    let filter = DetailFilter {
        kinds: Vec::new(),
        methods: Vec::new(),
        ..query.filter.clone()
    };
    let in_range: Vec<&Transaction> = ledger
        .iter()
        .filter(|t| is_credit_card(&t.method))
        .filter(|t| query.card.as_deref().map_or(true, |c| t.method == c))
        .filter(|t| t.date.is_some_and(|d| query.from <= d && d <= query.to))
        .filter(|t| filter.matches(t))
        .collect();

    let expenses: Vec<&Transaction> = in_range.iter().copied().filter(|t| t.is(Kind::Expense)).collect();
    let credits: Vec<&Transaction> = if query.include_credits {
        in_range.iter().copied().filter(|t| is_refund(t)).collect()
    } else {
        Vec::new()
    };

    let spent: Decimal = expenses.iter().map(|t| t.value().abs()).sum();
    let credited: Decimal = credits.iter().map(|t| t.value()).sum();
    Invoice {
        by_category: breakdown(expenses.iter().copied(), GroupBy::Category),
        total: (spent - credited).max(Decimal::ZERO),
        expenses,
        credits,
        spent,
        credited,
    }
}

// ---------------------------------------------------------------------------
// Upcoming
// ---------------------------------------------------------------------------

/// Rows dated after `today`, earliest first (future installments and the like).
pub fn upcoming(ledger: &Ledger, today: NaiveDate) -> Vec<&Transaction> {
    let mut rows: Vec<&Transaction> = ledger.iter().filter(|t| t.date.is_some_and(|d| d > today)).collect();
    rows.sort_by_key(|t| t.date);
    rows
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

    fn row(date: &str, resp: &str, kind: &str, desc: &str, cat: &str, method: &str, amount: &str) -> Row {
        [date, resp, kind, desc, cat, method, amount]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample() -> Ledger {
        let mut raw = vec![ledger_header_row()];
        raw.extend([
            row("02/01/2024", "Ana", "Receita", "Salário", "Salário", "Crédito em Conta", "5.000,00"),
            row("03/01/2024", "Ana", "Despesa", "Mercado", "Supermercado", "Cartão de Crédito", "200,00"),
            row("04/01/2024", "Bruno", "Despesa", "Padaria", "Supermercado", "Pix", "50,00"),
            row("05/01/2024", "Bruno", "Despesa", "Cinema", "Lazer", "Cartão de Crédito Nubank", "80,00"),
            row("06/01/2024", "Ana", "Receita", "Estorno loja", "Estorno", "Cartão de Crédito", "30,00"),
            row("07/01/2024", "Ana", "Despesa", "Café", "Restaurante", "Cartão de Débito", "12,00"),
            row("10/01/2024", "Ana", "Transferência", "Fatura", "Pagamento Cartão", "Transferência Bancária", "250,00"),
            row("03/02/2024", "Ana", "Despesa", "Mercado", "Supermercado", "Cartão de Crédito", "999,00"),
        ]);
        ingest(&raw)
    }

    fn jan() -> Period {
        Period::new(2024, 1).unwrap()
    }

    #[test]
    fn test_expense_breakdown_sorted_by_total() {
        let l = sample();
        let o = get_overview(&l, jan());
        assert_eq!(o.rows, 7);
        assert_eq!(o.expenses.total, dec("342"));
        let cats: Vec<(&str, Decimal, usize)> = o
            .expenses
            .by_category
            .iter()
            .map(|i| (i.name.as_str(), i.total, i.count))
            .collect();
        assert_eq!(
            cats,
            vec![
                ("Supermercado", dec("250"), 2),
                ("Lazer", dec("80"), 1),
                ("Restaurante", dec("12"), 1),
            ]
        );
        assert_eq!(o.expenses.by_responsible[0].name, "Ana");
        assert_eq!(o.balances.card_cash_out, dec("250"));
    }

    #[test]
    fn test_income_breakdown() {
        let inc = get_income(&sample(), jan());
        assert_eq!(inc.total, dec("5030"));
        assert_eq!(inc.count, 2);
        assert_eq!(inc.by_category[0].name, "Salário");
    }

    #[test]
    fn test_detail_filters_combine() {
        let l = sample();
        let filter = DetailFilter {
            kinds: vec![Kind::Expense],
            responsible: vec!["Bruno".to_string()],
            ..Default::default()
        };
        let rows = get_detail(&l, jan(), &filter);
        assert_eq!(rows.len(), 2);
        assert!(filter.is_active());

        let search = DetailFilter {
            search: Some("  PADARIA ".to_string()),
            ..Default::default()
        };
        let rows = get_detail(&l, jan(), &search);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Padaria");

        // category text is searched too
        let by_category = DetailFilter {
            search: Some("mercado".to_string()),
            ..Default::default()
        };
        assert_eq!(get_detail(&l, jan(), &by_category).len(), 2);

        let accent = DetailFilter {
            search: Some("cafe".to_string()),
            ..Default::default()
        };
        assert_eq!(get_detail(&l, jan(), &accent).len(), 1);
        assert!(!DetailFilter::default().is_active());
        assert_eq!(get_detail(&l, jan(), &DetailFilter::default()).len(), 7);
    }

    #[test]
    fn test_credit_card_detection() {
        assert!(is_credit_card("Cartão de Crédito"));
        assert!(is_credit_card("cartao de credito nubank"));
        assert!(is_credit_card("CARTÃO  DE  CRÉDITO"));
        assert!(!is_credit_card("Cartão de Débito"));
        assert!(!is_credit_card("Pix"));
        assert_eq!(
            card_methods(&sample()),
            vec!["Cartão de Crédito".to_string(), "Cartão de Crédito Nubank".to_string()]
        );
    }

    #[test]
    fn test_invoice_nets_refunds() {
        let l = sample();
        let inv = card_invoice(&l, &InvoiceQuery::for_period(jan()));
        assert_eq!(inv.expenses.len(), 2);
        assert_eq!(inv.spent, dec("280"));
        assert_eq!(inv.credited, dec("30"));
        assert_eq!(inv.total, dec("250"));
        assert_eq!(inv.by_category[0].name, "Supermercado");

        let q = InvoiceQuery {
            include_credits: false,
            ..InvoiceQuery::for_period(jan())
        };
        assert_eq!(card_invoice(&l, &q).total, dec("280"));
    }

    #[test]
    fn test_invoice_single_card_and_range() {
        let l = sample();
        let q = InvoiceQuery {
            card: Some("Cartão de Crédito Nubank".to_string()),
            ..InvoiceQuery::for_period(jan())
        };
        let inv = card_invoice(&l, &q);
        assert_eq!(inv.total, dec("80"));
        assert!(inv.credits.is_empty());

        let q = InvoiceQuery {
            from: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            ..InvoiceQuery::for_period(jan())
        };
        assert_eq!(card_invoice(&l, &q).spent, dec("1079"));
    }

    #[test]
    fn test_invoice_never_negative() {
        let mut raw = vec![ledger_header_row()];
        raw.push(row("06/01/2024", "Ana", "Receita", "Estorno", "estornos", "Cartão de Crédito", "90"));
        raw.push(row("07/01/2024", "Ana", "Despesa", "Loja", "Vestuário", "Cartão de Crédito", "40"));
        let l = ingest(&raw);
        let inv = card_invoice(&l, &InvoiceQuery::for_period(jan()));
        assert_eq!(inv.credited, dec("90"));
        assert_eq!(inv.total, Decimal::ZERO);
    }

    #[test]
    fn test_upcoming_after_today_in_date_order() {
        let l = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let rows = upcoming(&l, today);
        let descs: Vec<&str> = rows.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descs, vec!["Café", "Fatura", "Mercado"]);
    }
}
