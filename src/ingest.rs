use std::collections::HashSet;

use log::{debug, warn};

use crate::dates::parse_date;
use crate::models::{signed_amount, Kind, Row, Transaction};
use crate::text::normalize_text;
use crate::value::parse_money;

/// Only the first rows of a sheet are searched for a header.
pub const HEADER_SCAN_LIMIT: usize = 300;

/// A row is a header when at least this many distinct cells are known labels.
pub const HEADER_MIN_MATCHES: usize = 3;

// Compared against accent-folded, lowercased cells, so "Descrição" and
// "descricao" both match "descricao".
const HEADER_TOKENS: &[&str] = &[
    "data",
    "date",
    "responsavel",
    "responsible",
    "tipo",
    "type",
    "kind",
    "descricao",
    "description",
    "categoria",
    "category",
    "valor",
    "value",
    "amount",
    "metodo",
    "method",
    "forma",
];

const METHOD_LABELS: &[&str] = &[
    "metodo",
    "metodo de pagamento",
    "metodo de recebimento",
    "metodo de pagamento/recebimento",
    "forma de pagamento",
    "forma de recebimento",
    "method",
    "payment method",
];

/// Logical ledger columns, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Responsible,
    Kind,
    Description,
    Category,
    Method,
    Amount,
}

impl Field {
    fn index(self) -> usize {
        self as usize
    }

    /// Map a source header label to its canonical field.
    pub fn from_label(label: &str) -> Option<Field> {
        let n = normalize_text(label);
        match n.as_str() {
            "data" | "date" => Some(Self::Date),
            "responsavel" | "responsible" => Some(Self::Responsible),
            "tipo" | "type" | "kind" => Some(Self::Kind),
            "descricao" | "description" => Some(Self::Description),
            "categoria" | "category" => Some(Self::Category),
            "amount" | "value" => Some(Self::Amount),
            _ if METHOD_LABELS.contains(&n.as_str()) => Some(Self::Method),
            _ if n.starts_with("valor") => Some(Self::Amount),
            _ => None,
        }
    }
}

/// Index of the first row among the first [`HEADER_SCAN_LIMIT`] that looks
/// like the ledger header.
pub fn find_header(rows: &[Row]) -> Option<usize> {
    rows.iter().take(HEADER_SCAN_LIMIT).position(|row| {
        let tokens: HashSet<String> = row
            .iter()
            .map(|c| normalize_text(c))
            .filter(|t| !t.is_empty())
            .collect();
        tokens
            .iter()
            .filter(|t| HEADER_TOKENS.contains(&t.as_str()))
            .count()
            >= HEADER_MIN_MATCHES
    })
}

/// Normalized ledger plus what the load had to forgive.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub header_row: Option<usize>,
    pub unparsed_dates: usize,
    pub unparsed_amounts: usize,
}

impl Ledger {
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let unparsed_dates = transactions.iter().filter(|t| t.date.is_none()).count();
        let unparsed_amounts = transactions.iter().filter(|t| t.amount.is_none()).count();
        Self {
            transactions,
            header_row: None,
            unparsed_dates,
            unparsed_amounts,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// Build a transaction from the seven logical cells. Never fails: cells that
/// cannot be read become `None` and keep their raw text.
pub fn normalize_record(cells: [String; 7]) -> Transaction {
    let [date, responsible, kind, description, category, method, amount] =
        cells.map(|c| c.trim().to_string());

    let parsed_kind = Kind::parse(&kind);
    Transaction {
        date: parse_date(&date),
        raw_date: date,
        responsible,
        kind: parsed_kind,
        kind_label: parsed_kind.map(|k| k.label().to_string()).unwrap_or(kind),
        description,
        category,
        method,
        amount: parse_money(&amount).map(|v| signed_amount(v, parsed_kind)),
        raw_amount: amount,
    }
}

fn positional_cells(row: &Row) -> [String; 7] {
    std::array::from_fn(|i| row.get(i).cloned().unwrap_or_default())
}

/// Turn raw sheet rows into the normalized ledger.
///
/// With a detected header, rows above it are dropped and columns are
/// matched by label. Without one, the first seven columns are read in
/// positional order and an empty kind means an expense.
pub fn ingest(rows: &[Row]) -> Ledger {
    let header_row = find_header(rows);
    let mut transactions = Vec::new();

    match header_row {
        Some(idx) => {
            debug!("ledger header found at row {idx}");
            let mut columns: [Option<usize>; 7] = [None; 7];
            for (col, label) in rows[idx].iter().enumerate() {
                if let Some(field) = Field::from_label(label) {
                    columns[field.index()].get_or_insert(col);
                }
            }
            for row in &rows[idx + 1..] {
                let cells: [String; 7] = std::array::from_fn(|i| {
                    columns[i]
                        .and_then(|col| row.get(col).cloned())
                        .unwrap_or_default()
                });
                if is_blank(&cells) {
                    continue;
                }
                transactions.push(normalize_record(cells));
            }
        }
        None => {
            debug!("no ledger header found, reading {} rows positionally", rows.len());
            for row in rows {
                let mut cells = positional_cells(row);
                if is_blank(&cells) {
                    continue;
                }
                if cells[Field::Kind.index()].trim().is_empty() {
                    cells[Field::Kind.index()] = Kind::Expense.label().to_string();
                }
                transactions.push(normalize_record(cells));
            }
        }
    }

    let mut ledger = Ledger::from_transactions(transactions);
    ledger.header_row = header_row;
    if ledger.unparsed_dates > 0 || ledger.unparsed_amounts > 0 {
        warn!(
            "{} rows with unreadable dates, {} with unreadable amounts",
            ledger.unparsed_dates, ledger.unparsed_amounts
        );
    }
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger_header_row;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_find_header_canonical() {
        let rows = vec![ledger_header_row(), row(&["05/01/2024", "Ana", "Despesa"])];
        assert_eq!(find_header(&rows), Some(0));
    }

    #[test]
    fn test_find_header_needs_three_matches() {
        let rows = vec![
            row(&["Data", "Valor", "x"]),
            row(&["data", "valor", "tipo"]),
        ];
        assert_eq!(find_header(&rows), Some(1));
        assert_eq!(find_header(&rows[..1]), None);
    }

    #[test]
    fn test_find_header_counts_distinct_labels() {
        let rows = vec![row(&["Data", "data", "DATA", "Valor"])];
        assert_eq!(find_header(&rows), None);
    }

    #[test]
    fn test_find_header_after_noise() {
        let mut rows: Vec<Row> = (0..12).map(|i| row(&["", &format!("nota {i}"), ""])).collect();
        rows.push(row(&["Tipo", "Descricao", "Responsavel", "Data", "Valor (R$)"]));
        for _ in 0..40 {
            rows.push(row(&["", "", ""]));
        }
        assert_eq!(find_header(&rows), Some(12));
    }

    #[test]
    fn test_find_header_respects_scan_limit() {
        let mut rows: Vec<Row> = (0..HEADER_SCAN_LIMIT).map(|_| row(&["x"])).collect();
        rows.push(ledger_header_row());
        assert_eq!(find_header(&rows), None);
    }

    #[test]
    fn test_field_from_label_synonyms() {
        assert_eq!(Field::from_label("Responsável"), Some(Field::Responsible));
        assert_eq!(Field::from_label("responsavel"), Some(Field::Responsible));
        assert_eq!(Field::from_label("Descrição"), Some(Field::Description));
        assert_eq!(Field::from_label("Forma de Pagamento"), Some(Field::Method));
        assert_eq!(Field::from_label("Método de Pagamento/Recebimento"), Some(Field::Method));
        assert_eq!(Field::from_label("Valor (R$)"), Some(Field::Amount));
        assert_eq!(Field::from_label("Observações"), None);
    }

    #[test]
    fn test_ingest_header_reorders_columns_and_fills_missing() {
        let rows = vec![
            row(&["Relatório de gastos"]),
            row(&["Valor", "Tipo", "Data", "Descrição", "Notas"]),
            row(&["150,00", "Despesa", "05/01/2024", "Mercado", "ignorar"]),
        ];
        let ledger = ingest(&rows);
        assert_eq!(ledger.header_row, Some(1));
        assert_eq!(ledger.len(), 1);
        let t = &ledger.transactions[0];
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(t.kind, Some(Kind::Expense));
        assert_eq!(t.amount, Some(dec("-150.00")));
        assert_eq!(t.description, "Mercado");
        assert_eq!(t.category, "");
        assert_eq!(t.method, "");
        assert_eq!(t.responsible, "");
    }

    #[test]
    fn test_ingest_drops_blank_rows_and_trims() {
        let rows = vec![
            ledger_header_row(),
            row(&["", " ", "", "", "", "", ""]),
            row(&[" 10/01/2024 ", " Ana ", "Receita", " Salário ", "Salário", "Pix", " 1.000,00 "]),
            row(&[]),
        ];
        let ledger = ingest(&rows);
        assert_eq!(ledger.len(), 1);
        let t = &ledger.transactions[0];
        assert_eq!(t.responsible, "Ana");
        assert_eq!(t.description, "Salário");
        assert_eq!(t.amount, Some(dec("1000.00")));
    }

    #[test]
    fn test_ingest_positional_defaults_kind_to_expense() {
        let rows = vec![
            row(&["05/01/2024", "Ana", "", "Padaria", "Restaurante", "Pix", "12,50"]),
            row(&["", "", "", "", "", "", ""]),
            row(&["06/01/2024", "Ana", "Receita", "Venda", "Vendas", "Pix", "-80"]),
        ];
        let ledger = ingest(&rows);
        assert_eq!(ledger.header_row, None);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.transactions[0].kind, Some(Kind::Expense));
        assert_eq!(ledger.transactions[0].amount, Some(dec("-12.50")));
        assert_eq!(ledger.transactions[1].amount, Some(dec("80")));
    }

    #[test]
    fn test_ingest_keeps_rows_with_unreadable_cells() {
        let rows = vec![
            ledger_header_row(),
            row(&["semana que vem", "Ana", "Despesa", "Luz", "Moradia", "Pix", "cem reais"]),
        ];
        let ledger = ingest(&rows);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.unparsed_dates, 1);
        assert_eq!(ledger.unparsed_amounts, 1);
        let t = &ledger.transactions[0];
        assert_eq!(t.date, None);
        assert_eq!(t.raw_date, "semana que vem");
        assert_eq!(t.amount, None);
        assert_eq!(t.raw_amount, "cem reais");
    }

    #[test]
    fn test_ingest_sign_never_trusts_raw_input() {
        let rows = vec![
            ledger_header_row(),
            row(&["01/01/2024", "", "Despesa", "", "", "", "100"]),
            row(&["01/01/2024", "", "Despesa", "", "", "", "-100"]),
            row(&["01/01/2024", "", "Transferência", "", "", "", "100"]),
            row(&["01/01/2024", "", "Receita", "", "", "", "-100"]),
            row(&["01/01/2024", "", "Saldo", "", "", "", "-100"]),
        ];
        let ledger = ingest(&rows);
        for t in ledger.iter() {
            let v = t.amount.unwrap();
            match t.kind.unwrap() {
                Kind::Expense | Kind::Transfer => assert!(v <= Decimal::ZERO),
                Kind::Income | Kind::Balance => assert!(v >= Decimal::ZERO),
            }
        }
    }

    #[test]
    fn test_ingest_serial_dates() {
        let rows = vec![ledger_header_row(), row(&["45300", "", "Despesa", "", "", "", "1"])];
        let ledger = ingest(&rows);
        assert_eq!(ledger.transactions[0].date, NaiveDate::from_ymd_opt(2024, 1, 9));
    }

    #[test]
    fn test_ingest_empty_sheet() {
        let ledger = ingest(&[]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.header_row, None);
    }
}
