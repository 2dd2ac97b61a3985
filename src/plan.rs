use std::collections::BTreeMap;

use log::{info, warn};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::ingest::Ledger;
use crate::models::{Row, EXPENSE_CATEGORIES};
use crate::period::{select_period, Period};
use crate::store::{Store, PLAN_SHEET};
use crate::text::normalize_text;
use crate::value::parse_money;

/// Fixed leading columns of the plan sheet; expense categories follow.
pub const PLAN_FIXED_COLUMNS: [&str; 6] =
    ["Ano", "Mês", "Salário A", "Salário B", "Extras", "Investimentos"];

/// Budget for one month.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyPlan {
    pub year: i32,
    pub month: u32,
    pub salary_a: Decimal,
    pub salary_b: Decimal,
    pub extra_income: Decimal,
    pub investment_income: Decimal,
    /// Planned spend per expense category.
    pub budget: BTreeMap<String, Decimal>,
}

impl MonthlyPlan {
    pub fn new(period: Period) -> Self {
        Self {
            year: period.year(),
            month: period.month(),
            ..Default::default()
        }
    }

    pub fn planned_income(&self) -> Decimal {
        self.salary_a + self.salary_b + self.extra_income + self.investment_income
    }

    pub fn planned_expense(&self) -> Decimal {
        self.budget.values().copied().sum()
    }

    pub fn planned_result(&self) -> Decimal {
        self.planned_income() - self.planned_expense()
    }
}

pub fn plan_header() -> Row {
    PLAN_FIXED_COLUMNS
        .iter()
        .chain(EXPENSE_CATEGORIES.iter())
        .map(|s| s.to_string())
        .collect()
}

fn parse_int(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| cell.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn amount(cell: Option<&String>) -> Decimal {
    cell.and_then(|c| parse_money(c)).unwrap_or_default()
}

fn plan_from_row(header: &[String], row: &[String]) -> Option<MonthlyPlan> {
    let year = parse_int(row.first()?)?;
    let month = parse_int(row.get(1)?)?;
    let mut plan = MonthlyPlan {
        year: i32::try_from(year).ok()?,
        month: u32::try_from(month).ok()?,
        salary_a: amount(row.get(2)),
        salary_b: amount(row.get(3)),
        extra_income: amount(row.get(4)),
        investment_income: amount(row.get(5)),
        budget: BTreeMap::new(),
    };
    for (i, category) in header.iter().enumerate().skip(PLAN_FIXED_COLUMNS.len()) {
        if !category.trim().is_empty() {
            plan.budget.insert(category.trim().to_string(), amount(row.get(i)));
        }
    }
    Some(plan)
}

fn plan_to_row(header: &[String], plan: &MonthlyPlan) -> Row {
    let mut row = vec![
        plan.year.to_string(),
        plan.month.to_string(),
        format!("{:.2}", plan.salary_a),
        format!("{:.2}", plan.salary_b),
        format!("{:.2}", plan.extra_income),
        format!("{:.2}", plan.investment_income),
    ];
    for category in header.iter().skip(PLAN_FIXED_COLUMNS.len()) {
        let value = plan.budget.get(category.trim()).copied().unwrap_or_default();
        row.push(format!("{value:.2}"));
    }
    for category in plan.budget.keys() {
        if !header.iter().any(|h| h.trim() == category) {
            warn!("plan sheet has no column for {category:?}; budget not saved");
        }
    }
    row
}

/// The plan for `period` and its row index in the sheet, if one exists.
pub fn load_plan<S: Store>(store: &S, period: Period) -> Result<Option<(usize, MonthlyPlan)>> {
    let rows = store.read_all_rows(PLAN_SHEET)?;
    let Some((header, body)) = rows.split_first() else {
        return Ok(None);
    };
    Ok(body.iter().enumerate().find_map(|(i, row)| {
        plan_from_row(header, row)
            .filter(|p| p.year == period.year() && p.month == period.month())
            .map(|p| (i + 1, p))
    }))
}

/// Overwrite the plan row for the same month, or append a new one.
pub fn upsert_plan<S: Store>(store: &S, plan: &MonthlyPlan) -> Result<()> {
    store.ensure_header(PLAN_SHEET, &plan_header())?;
    let header = store
        .read_all_rows(PLAN_SHEET)?
        .into_iter()
        .next()
        .unwrap_or_else(plan_header);
    let row = plan_to_row(&header, plan);
    let period = Period::new(plan.year, plan.month)?;
    match load_plan(store, period)? {
        Some((index, _)) => {
            store.update_row(PLAN_SHEET, index, &row)?;
            info!("updated plan for {period}");
        }
        None => {
            store.append_row(PLAN_SHEET, &row)?;
            info!("added plan for {period}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanLine {
    pub category: String,
    pub planned: Decimal,
    pub actual: Decimal,
    /// `planned - actual`; negative means over budget.
    pub difference: Decimal,
}

/// Planned against actual spend per category for `period`.
///
/// Covers every category that is budgeted or has spending. Categories match
/// ignoring accents and case; the budget's spelling wins.
pub fn compare_plan(plan: &MonthlyPlan, ledger: &Ledger, period: Period) -> Vec<PlanLine> {
    let mut lines: BTreeMap<String, (String, Decimal, Decimal)> = BTreeMap::new();
    for (category, planned) in &plan.budget {
        let entry = lines
            .entry(normalize_text(category))
            .or_insert_with(|| (category.clone(), Decimal::ZERO, Decimal::ZERO));
        entry.1 += *planned;
    }
    for t in select_period(ledger, period).expense {
        let entry = lines
            .entry(normalize_text(&t.category))
            .or_insert_with(|| (t.category.trim().to_string(), Decimal::ZERO, Decimal::ZERO));
        entry.2 += t.value();
    }
    lines
        .into_values()
        .filter(|(_, planned, actual)| !planned.is_zero() || !actual.is_zero())
        .map(|(category, planned, actual)| {
            let actual = actual.abs();
            PlanLine {
                category,
                planned,
                actual,
                difference: planned - actual,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
    use crate::models::ledger_header_row;
    use crate::store::SqliteStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn jan() -> Period {
        Period::new(2024, 1).unwrap()
    }

    fn sample_plan() -> MonthlyPlan {
        let mut plan = MonthlyPlan::new(jan());
        plan.salary_a = dec("5000");
        plan.salary_b = dec("3000");
        plan.extra_income = dec("250.50");
        plan.budget.insert("Supermercado".to_string(), dec("1200"));
        plan.budget.insert("Lazer".to_string(), dec("300"));
        plan
    }

    #[test]
    fn test_planned_totals() {
        let plan = sample_plan();
        assert_eq!(plan.planned_income(), dec("8250.50"));
        assert_eq!(plan.planned_expense(), dec("1500"));
        assert_eq!(plan.planned_result(), dec("6750.50"));
    }

    #[test]
    fn test_upsert_appends_then_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(load_plan(&store, jan()).unwrap().is_none());

        upsert_plan(&store, &sample_plan()).unwrap();
        let mut feb = MonthlyPlan::new(Period::new(2024, 2).unwrap());
        feb.salary_a = dec("1");
        upsert_plan(&store, &feb).unwrap();

        let mut changed = sample_plan();
        changed.salary_b = dec("3500");
        upsert_plan(&store, &changed).unwrap();

        let rows = store.read_all_rows(PLAN_SHEET).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], plan_header());
        let (index, loaded) = load_plan(&store, jan()).unwrap().unwrap();
        assert_eq!(index, 1);
        assert_eq!(loaded.salary_b, dec("3500"));
        assert_eq!(loaded.budget["Supermercado"], dec("1200"));
        assert_eq!(loaded.budget["Educação"], Decimal::ZERO);
        assert_eq!(loaded.budget.len(), EXPENSE_CATEGORIES.len());
        assert_eq!(load_plan(&store, Period::new(2024, 2).unwrap()).unwrap().unwrap().1.salary_a, dec("1"));
    }

    #[test]
    fn test_plan_rows_tolerate_float_year_cells() {
        let store = SqliteStore::open_in_memory().unwrap();
        let header = plan_header();
        let row: Row = ["2024.0", "1", "1.000,00", "", "x"].iter().map(|s| s.to_string()).collect();
        store.append_rows(PLAN_SHEET, &[header, row]).unwrap();
        let (_, plan) = load_plan(&store, jan()).unwrap().unwrap();
        assert_eq!(plan.salary_a, dec("1000"));
        assert_eq!(plan.planned_income(), dec("1000"));
    }

    #[test]
    fn test_compare_covers_budgeted_and_spent_categories() {
        let mut raw = vec![ledger_header_row()];
        for (date, cat, amount) in [
            ("05/01/2024", "Supermercado", "900"),
            ("06/01/2024", "supermercado", "400"),
            ("07/01/2024", "Farmácia", "50"),
            ("07/02/2024", "Lazer", "999"),
        ] {
            raw.push(
                [date, "Ana", "Despesa", "x", cat, "Pix", amount]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            );
        }
        let ledger = ingest(&raw);
        let lines = compare_plan(&sample_plan(), &ledger, jan());
        let view: Vec<(&str, Decimal, Decimal, Decimal)> = lines
            .iter()
            .map(|l| (l.category.as_str(), l.planned, l.actual, l.difference))
            .collect();
        assert_eq!(
            view,
            vec![
                ("Farmácia", Decimal::ZERO, dec("50"), dec("-50")),
                ("Lazer", dec("300"), Decimal::ZERO, dec("300")),
                ("Supermercado", dec("1200"), dec("1300"), dec("-100")),
            ]
        );
    }
}
