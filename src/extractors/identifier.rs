// src/extractors/identifier.rs
use once_cell::sync::Lazy;
use regex::Regex;

// One upper-case letter followed by exactly eight digits, as a whole word (Spanish CIF/NIF shape)
static TAX_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]\d{8}\b").expect("Failed to compile TAX_ID_RE")
});

/// Returns the first tax identifier in the text, if any.
pub fn find_tax_id(text: &str) -> Option<&str> {
    let found = TAX_ID_RE.find(text).map(|m| m.as_str());
    match found {
        Some(id) => tracing::debug!("Found tax identifier {}", id),
        None => tracing::warn!("No tax identifier found in document text"),
    }
    found
}

/// Regex source used to highlight identifiers in debug dumps.
pub fn tax_id_pattern() -> &'static str {
    TAX_ID_RE.as_str()
}
