use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dates::format_date;
use crate::text::normalize_text;

pub type Row = Vec<String>;

/// Column labels written as the ledger header, in positional order.
pub const LEDGER_HEADER: [&str; 7] = [
    "Data",
    "Responsável",
    "Tipo",
    "Descrição",
    "Categoria",
    "Método de Pagamento/Recebimento",
    "Valor",
];

/// Transfers in this category pay a credit-card bill.
pub const CARD_PAYMENT_CATEGORY: &str = "Pagamento Cartão";
pub const CARD_PAYMENT_METHOD: &str = "Transferência Bancária";
pub const CREDIT_CARD_METHOD: &str = "Cartão de Crédito";
pub const SYSTEM_RESPONSIBLE: &str = "Sistema";
pub const BALANCE_CATEGORY: &str = "Saldo";

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Supermercado",
    "Restaurante",
    "Moradia",
    "Uber",
    "Gasolina",
    "Manutenção Veículo",
    "Casa e Jardim",
    "Funcionários",
    "Assinaturas",
    "Educação",
    "Lazer",
    "Farmácia",
    "Presentes",
    "Estacionamento",
    "Vestuário",
    "Beleza",
    "Estornos",
    "Ressarcimentos",
    "Tributos",
    "Outra",
];

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salário",
    "Vendas",
    "Ressarcimento",
    "Estorno",
    "Tributos",
    "Vestuário",
    "Beleza",
    "Outra",
];

pub const METHODS: &[&str] = &[
    "Cartão de Crédito",
    "Cartão de Débito",
    "Pix",
    "Dinheiro",
    "Crédito em Conta",
    "Transferência Bancária",
    "Vale-Presente",
    "Outra",
];

pub const DEFAULT_ACCOUNTS: &[&str] = &["Banco do Brasil", "BRB", "Banco Inter", "C6 Bank", "Itaú"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Income,
    Expense,
    Transfer,
    /// Absolute account snapshot, not a flow.
    Balance,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Expense, Kind::Income, Kind::Transfer, Kind::Balance];

    /// Label stored in the ledger.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Receita",
            Self::Expense => "Despesa",
            Self::Transfer => "Transferência",
            Self::Balance => "Saldo",
        }
    }

    /// Accepts the stored Portuguese labels (with or without accents) and English names.
    pub fn parse(raw: &str) -> Option<Kind> {
        match normalize_text(raw).as_str() {
            "receita" | "income" => Some(Self::Income),
            "despesa" | "expense" => Some(Self::Expense),
            "transferencia" | "transfer" => Some(Self::Transfer),
            "saldo" | "balance" => Some(Self::Balance),
            _ => None,
        }
    }

    /// Expenses and transfers are outflows and are stored negative.
    pub fn is_outflow(&self) -> bool {
        matches!(self, Self::Expense | Self::Transfer)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Force the sign of `amount` from the row kind; the raw sign is never trusted.
pub fn signed_amount(amount: Decimal, kind: Option<Kind>) -> Decimal {
    match kind {
        Some(k) if k.is_outflow() => -amount.abs(),
        _ => amount.abs(),
    }
}

/// One normalized ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// `None` when the cell could not be read; such rows never fall in a period.
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub responsible: String,
    pub kind: Option<Kind>,
    /// Canonical label for known kinds, the source text otherwise.
    pub kind_label: String,
    pub description: String,
    pub category: String,
    pub method: String,
    pub amount: Option<Decimal>,
    pub raw_amount: String,
}

impl Transaction {
    pub fn is(&self, kind: Kind) -> bool {
        self.kind == Some(kind)
    }

    /// Amount for aggregation: missing counts as zero.
    pub fn value(&self) -> Decimal {
        self.amount.unwrap_or_default()
    }

    /// Back to the stored row form. Unparseable cells keep their raw text.
    pub fn to_row(&self) -> Row {
        vec![
            self.date.map(format_date).unwrap_or_else(|| self.raw_date.clone()),
            self.responsible.clone(),
            self.kind_label.clone(),
            self.description.clone(),
            self.category.clone(),
            self.method.clone(),
            self.amount
                .map(|a| format!("{a:.2}"))
                .unwrap_or_else(|| self.raw_amount.clone()),
        ]
    }
}

pub fn ledger_header_row() -> Row {
    LEDGER_HEADER.iter().map(|s| s.to_string()).collect()
}
