use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount in the pt-BR convention: `R$ 1.234,56`, negatives as `R$ -1.234,56`.
pub fn money(val: Decimal) -> String {
    let rounded = val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("R$ -{with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

/// Format a raw cell holding a plain number; anything else is returned unchanged.
pub fn money_cell(raw: &str) -> String {
    match Decimal::from_str(raw.trim()) {
        Ok(v) => money(v),
        Err(_) => raw.to_string(),
    }
}

/// Format an optional amount, leaving missing values blank.
pub fn money_opt(val: Option<Decimal>) -> String {
    val.map(money).unwrap_or_default()
}

pub fn format_bytes(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
