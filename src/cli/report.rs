use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::error::{CaixaError, Result};
use crate::fmt::{money, money_opt};
use crate::models::{Kind, Transaction};
use crate::reports::{self, BreakdownItem, Breakdowns, DetailFilter, InvoiceQuery};
use crate::settings::Settings;

use super::{open_repo, parse_date_arg, resolve_period, today};

fn signed(val: Decimal) -> String {
    if val.is_sign_negative() && !val.is_zero() {
        money(val).red().to_string()
    } else {
        money(val)
    }
}

fn breakdown_table(title: &str, label: &str, items: &[BreakdownItem]) {
    if items.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![label, "Lançamentos", "Total"]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(item.count),
            Cell::new(money(item.total)),
        ]);
    }
    let count: usize = items.iter().map(|i| i.count).sum();
    let total: Decimal = items.iter().map(|i| i.total).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(count),
        Cell::new(money(total)),
    ]);
    println!("\n{title}\n{table}");
}

fn print_breakdowns(what: &str, b: &Breakdowns) {
    breakdown_table(&format!("{what} por Categoria"), "Categoria", &b.by_category);
    breakdown_table(&format!("{what} por Método"), "Método", &b.by_method);
    breakdown_table(&format!("{what} por Responsável"), "Responsável", &b.by_responsible);
}

fn rows_table(rows: &[&Transaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Data", "Responsável", "Tipo", "Descrição", "Categoria", "Método", "Valor"]);
    for t in rows {
        let row = t.to_row();
        table.add_row(vec![
            Cell::new(&row[0]),
            Cell::new(&t.responsible),
            Cell::new(&t.kind_label),
            Cell::new(&t.description),
            Cell::new(&t.category),
            Cell::new(&t.method),
            Cell::new(t.amount.map(signed).unwrap_or_else(|| t.raw_amount.yellow().to_string())),
        ]);
    }
    table
}

pub fn overview(settings: &Settings, month: Option<&str>) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, month)?;
    let o = reports::get_overview(&loaded.ledger, period);
    let b = &o.balances;

    let mut table = Table::new();
    table.set_header(vec![format!("Visão Geral {}", o.period), "Valor".to_string()]);
    table.add_row(vec![Cell::new("Saldo inicial"), Cell::new(signed(b.opening))]);
    table.add_row(vec![Cell::new("Receitas".green()), Cell::new(money(b.income))]);
    table.add_row(vec![Cell::new("Despesas".red()), Cell::new(money(b.expense))]);
    table.add_row(vec![Cell::new("Resultado do período".bold()), Cell::new(signed(b.period_result))]);
    table.add_row(vec![Cell::new("Saída com fatura"), Cell::new(money(b.card_cash_out))]);
    table.add_row(vec![Cell::new("Variação de caixa"), Cell::new(signed(b.cash_variation))]);
    table.add_row(vec![Cell::new("Saldo final (caixa)".bold()), Cell::new(signed(b.closing_cash))]);
    table.add_row(vec![Cell::new("Saldo final"), Cell::new(signed(b.closing))]);
    if b.declared.is_some() {
        table.add_row(vec![Cell::new("Saldo declarado"), Cell::new(money_opt(b.declared))]);
    }
    println!("{table}");

    if o.rows == 0 {
        println!("\nNenhum registro neste período.");
        return Ok(());
    }
    print_breakdowns("Despesas", &o.expenses);
    Ok(())
}

pub fn income(settings: &Settings, month: Option<&str>) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, month)?;
    let inc = reports::get_income(&loaded.ledger, period);
    if inc.count == 0 {
        println!("Nenhuma receita em {period}.");
        return Ok(());
    }
    println!("Receitas {period}: {}", money(inc.total).green());
    print_breakdowns("Receitas", &inc);
    Ok(())
}

fn parse_kinds(kinds: &[String]) -> Result<Vec<Kind>> {
    kinds
        .iter()
        .map(|k| {
            Kind::parse(k).ok_or_else(|| {
                let known: Vec<&str> = Kind::ALL.iter().map(Kind::label).collect();
                CaixaError::Other(format!("Unknown kind: {k} (use {})", known.join(", ")))
            })
        })
        .collect()
}

pub fn detail(settings: &Settings, month: Option<&str>, filter: DetailFilter) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, month)?;
    let rows = reports::get_detail(&loaded.ledger, period, &filter);
    if rows.is_empty() {
        println!("Nada a detalhar em {period}.");
        return Ok(());
    }
    let total: Decimal = rows.iter().map(|t| t.value()).sum();
    let title = if filter.is_active() { " (filtrado)" } else { "" };
    println!("Detalhamento {period}{title}\n{}", rows_table(&rows));
    println!("{} lançamentos, soma {}", rows.len(), signed(total));
    Ok(())
}

pub fn detail_filter(
    kinds: &[String],
    categories: Vec<String>,
    responsible: Vec<String>,
    methods: Vec<String>,
    search: Option<String>,
) -> Result<DetailFilter> {
    Ok(DetailFilter {
        kinds: parse_kinds(kinds)?,
        categories,
        responsible,
        methods,
        search,
    })
}

pub struct InvoiceArgs {
    pub month: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub card: Option<String>,
    pub no_credits: bool,
    pub filter: DetailFilter,
}

pub fn invoice(settings: &Settings, args: InvoiceArgs) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, args.month.as_deref())?;
    let mut query = InvoiceQuery::for_period(period);
    if let Some(from) = args.from_date.as_deref() {
        query.from = parse_date_arg(from)?;
    }
    if let Some(to) = args.to_date.as_deref() {
        query.to = parse_date_arg(to)?;
    }
    if query.from > query.to {
        return Err(CaixaError::Other("--from must not be after --to".to_string()));
    }
    if let Some(card) = args.card {
        let known = reports::card_methods(&loaded.ledger);
        if !known.contains(&card) {
            return Err(CaixaError::Other(format!(
                "Unknown card: {card} (known: {})",
                known.join(", ")
            )));
        }
        query.card = Some(card);
    }
    query.include_credits = !args.no_credits;
    query.filter = args.filter;

    let inv = reports::card_invoice(&loaded.ledger, &query);
    if inv.expenses.is_empty() && inv.credits.is_empty() {
        println!("Nenhum lançamento nesse intervalo com os filtros aplicados.");
        return Ok(());
    }
    println!(
        "Fatura {} a {}: {}",
        query.from.format("%d/%m/%Y"),
        query.to.format("%d/%m/%Y"),
        money(inv.total).bold()
    );
    if !inv.credited.is_zero() {
        println!("Gastos no cartão:             {}", money(inv.spent));
        println!("Créditos (estornos) abatidos: {}", money(inv.credited));
    }
    breakdown_table("Gastos por categoria", "Categoria", &inv.by_category);

    let mut rows = inv.expenses.clone();
    rows.extend(inv.credits.iter().copied());
    println!("\nLançamentos\n{}", rows_table(&rows));
    Ok(())
}

pub fn upcoming(settings: &Settings) -> Result<()> {
    let repo = open_repo(settings)?;
    let loaded = repo.ledger()?;
    let rows = reports::upcoming(&loaded.ledger, today());
    if rows.is_empty() {
        println!("Nenhuma parcela futura registrada.");
        return Ok(());
    }
    println!("Lançamentos futuros\n{}", rows_table(&rows));
    Ok(())
}
