//! BRL currency parsing and formatting.
//!
//! Amounts arrive from forms typed the Brazilian way (`R$ 1.234,56`) and are
//! rendered back the same way. Everything in between is a plain `f64` in reais.

/// Parses a Brazilian-formatted amount into reais.
///
/// Accepts `"R$ 1.234,56"`, `"1.234,56"`, `"1234,56"` and `"-10,00"`. Only digits,
/// `,`, `.` and `-` are kept; `.` is a thousands separator and `,` the decimal mark.
/// Empty or unparsable input is `0.0`.
#[must_use]
pub fn parse_brl(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Rounds to whole cents, halves away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats an amount as `R$ 1.234,56` (negative: `-R$ 1.234,56`).
#[must_use]
pub fn format_brl(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let sign = if round2(value) < 0.0 { "-" } else { "" };

    let fixed = format!("{:.2}", value.abs());
    let (integer, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$ {grouped},{cents}")
}

/// Formats a percentage with one decimal, Brazilian style: `12,5%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%").replace('.', ",")
}
