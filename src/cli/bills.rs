use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{CaixaError, Result};
use crate::fmt::money;
use crate::recurring::{load_bills, pay_bill, pending_bills, register_bill, RecurringBill};
use crate::settings::Settings;

use super::{open_repo, parse_amount_arg, resolve_period, today};

pub fn list(settings: &Settings, month: Option<&str>) -> Result<()> {
    let repo = open_repo(settings)?;
    let bills = load_bills(repo.store())?;
    if bills.is_empty() {
        println!("Nenhuma conta recorrente cadastrada.");
        return Ok(());
    }
    let loaded = repo.ledger()?;
    let period = resolve_period(&loaded.ledger, month)?;
    let pending = pending_bills(&bills, &loaded.ledger, period);

    let mut table = Table::new();
    table.set_header(vec!["Conta", "Vencimento", "Valor padrão", "Categoria", "Responsável", "Situação"]);
    for bill in &bills {
        let open = pending.iter().any(|p| p.bill.key() == bill.key());
        table.add_row(vec![
            Cell::new(&bill.description),
            Cell::new(bill.due_date(period).format("%d/%m")),
            Cell::new(bill.default_amount_label()),
            Cell::new(&bill.category),
            Cell::new(&bill.responsible),
            Cell::new(if open { "a pagar".yellow() } else { "paga".green() }),
        ]);
    }
    println!("Pagamentos mensais {period}\n{table}");
    if pending.is_empty() {
        println!("Todas as contas do mês já foram pagas.");
    }
    for p in &pending {
        println!(
            "A pagar: {} até {}",
            p.bill.description,
            p.due.format("%d/%m/%Y")
        );
    }
    Ok(())
}

pub fn add(
    settings: &Settings,
    description: &str,
    due_day: u32,
    category: &str,
    responsible: &str,
    amount: Option<&str>,
) -> Result<()> {
    let bill = RecurringBill {
        description: description.trim().to_string(),
        default_amount: amount.map(parse_amount_arg).transpose()?,
        due_day,
        category: category.trim().to_string(),
        responsible: responsible.trim().to_string(),
    };
    let repo = open_repo(settings)?;
    register_bill(repo.store(), &bill)?;
    println!("Conta adicionada: {} (dia {})", bill.description, bill.due_day);
    Ok(())
}

pub fn pay(
    settings: &Settings,
    description: &str,
    amount: Option<&str>,
    method: &str,
    month: Option<&str>,
) -> Result<()> {
    let repo = open_repo(settings)?;
    let bills = load_bills(repo.store())?;
    let bill = bills
        .iter()
        .find(|b| b.description == description.trim())
        .ok_or_else(|| CaixaError::Other(format!("Bill not found: {description}")))?;
    let amount = match amount {
        Some(a) => parse_amount_arg(a)?,
        None => bill.default_amount.ok_or_else(|| {
            CaixaError::Validation(vec!["amount".to_string()])
        })?,
    };
    let period = resolve_period(&repo.ledger()?.ledger, month)?;
    let row = pay_bill(&repo, bill, period, amount, method, today())?;
    println!("Pagamento lançado: {} {}", row[3], money(-amount.abs()));
    Ok(())
}
