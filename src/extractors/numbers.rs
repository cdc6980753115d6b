// src/extractors/numbers.rs

/// Rewrites a European-formatted token into Rust float syntax:
/// dots (thousands) are dropped and commas (decimals) become dots.
pub fn delocalize(value: &str) -> String {
    value.replace('.', "").replace(',', ".")
}

/// Parses a finite float. `inf`/`nan` spellings are treated as text.
pub fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Whether a raw token reads as a number once parentheses and separators are removed.
pub fn is_numeric_token(token: &str) -> bool {
    let cleaned = delocalize(token);
    parse_number(cleaned.trim_matches(|c| c == '(' || c == ')')).is_some()
}
