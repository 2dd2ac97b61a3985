use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::error::{CaixaError, Result};
use crate::fmt::money;
use crate::plan::{compare_plan, load_plan, upsert_plan, MonthlyPlan};
use crate::settings::Settings;

use super::{open_repo, parse_amount_arg, resolve_period};

pub fn show(settings: &Settings, month: Option<&str>) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, month)?;
    let Some((_, plan)) = load_plan(repo.store(), period)? else {
        println!("Nenhum planejamento para {period}. Use `caixa plan set`.");
        return Ok(());
    };

    println!("Planejamento {}", period.name());
    println!("Receita prevista:  {}", money(plan.planned_income()));
    println!("Gastos previstos:  {}", money(plan.planned_expense()));
    println!("Saldo previsto:    {}", money(plan.planned_result()));

    let mut table = Table::new();
    table.set_header(vec!["Categoria", "Planejado", "Realizado", "Diferença"]);
    for line in compare_plan(&plan, &loaded.ledger, period) {
        let diff = if line.difference < Decimal::ZERO {
            money(line.difference).red().to_string()
        } else {
            money(line.difference)
        };
        table.add_row(vec![
            Cell::new(&line.category),
            Cell::new(money(line.planned)),
            Cell::new(money(line.actual)),
            Cell::new(diff),
        ]);
    }
    println!("\nPlanejado x Realizado\n{table}");
    Ok(())
}

pub struct PlanArgs {
    pub month: Option<String>,
    pub salary_a: Option<String>,
    pub salary_b: Option<String>,
    pub extras: Option<String>,
    pub investments: Option<String>,
    pub budget: Vec<String>,
}

pub fn set(settings: &Settings, args: PlanArgs) -> Result<()> {
    let repo = open_repo(settings)?;
    let period = resolve_period(&repo.ledger()?.ledger, args.month.as_deref())?;
    let mut plan = load_plan(repo.store(), period)?
        .map(|(_, p)| p)
        .unwrap_or_else(|| MonthlyPlan::new(period));

    let fields = [
        (&args.salary_a, &mut plan.salary_a),
        (&args.salary_b, &mut plan.salary_b),
        (&args.extras, &mut plan.extra_income),
        (&args.investments, &mut plan.investment_income),
    ];
    for (raw, slot) in fields {
        if let Some(raw) = raw {
            *slot = parse_amount_arg(raw)?;
        }
    }
    for item in &args.budget {
        let (category, amount) = item.split_once('=').ok_or_else(|| {
            CaixaError::Other(format!("Invalid budget: {item} (expected CATEGORY=AMOUNT)"))
        })?;
        plan.budget
            .insert(category.trim().to_string(), parse_amount_arg(amount)?);
    }

    upsert_plan(repo.store(), &plan)?;
    println!(
        "Planejamento salvo para {}: receita {}, gastos {}",
        period.name(),
        money(plan.planned_income()),
        money(plan.planned_expense())
    );
    Ok(())
}
