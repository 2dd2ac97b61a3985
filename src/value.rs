use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

fn number_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d*\.?\d*$").expect("static regex"))
}

/// Drop dots that look like thousands separators: a dot followed by exactly
/// three digits and then a non-digit or the end of the input.
fn strip_group_dots(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for (i, &b) in s.iter().enumerate() {
        if b == b'.' {
            let group = s.get(i + 1..i + 4);
            let is_group = group.is_some_and(|g| g.iter().all(u8::is_ascii_digit))
                && s.get(i + 4).map_or(true, |next| !next.is_ascii_digit());
            if is_group {
                continue;
            }
        }
        out.push(b);
    }
    out
}

/// Parse a free-form pt-BR money string (`R$ 1.234,56`, `-150,00`, `1000`)
/// into an exact amount. Currency symbols and spaces are ignored.
///
/// Returns `None` when no number can be read. A missing value is not zero:
/// entry validation rejects it, aggregation counts it as zero.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let kept: Vec<u8> = raw
        .bytes()
        .filter(|b| b.is_ascii_digit() || matches!(b, b',' | b'.' | b'-'))
        .collect();
    let mut s: String = strip_group_dots(&kept)
        .into_iter()
        .map(|b| if b == b',' { '.' } else { b as char })
        .collect();

    if !s.bytes().any(|b| b.is_ascii_digit()) || !number_shape().is_match(&s) {
        return None;
    }
    if s.ends_with('.') {
        s.push('0');
    }
    if let Some(rest) = s.strip_prefix("-.") {
        s = format!("-0.{rest}");
    } else if s.starts_with('.') {
        s.insert(0, '0');
    }
    Decimal::from_str(&s).ok()
}
