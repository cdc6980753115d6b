// src/extractors/keyword.rs

// --- Imports ---
use regex::Regex;

use crate::config::{ExtractionMode, KeywordSpec};
use crate::extractors::numbers::is_numeric_token;
use crate::extractors::ExtractionResult;

// Footnote references look like "Nota 1 2"; the marker and the two tokens after it are skipped
const FOOTNOTE_MARKER: &str = "Nota";
const FOOTNOTE_SKIP: usize = 2;
const MAX_NUMBERS_AFTER: usize = 2;

/// Applies every keyword spec to the document text.
pub struct KeywordExtractor<'a> {
    specs: &'a [KeywordSpec],
}

impl<'a> KeywordExtractor<'a> {
    pub fn new(specs: &'a [KeywordSpec]) -> Self {
        Self { specs }
    }

    /// Runs all specs against the full text. Never fails: misses are recorded as `None`.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for spec in self.specs {
            tracing::debug!("Extracting '{}' with mode {}", spec.keyword, spec.mode.name());

            match extract_values(text, spec) {
                Values::Single(value) => {
                    if value.is_none() {
                        tracing::info!("'{}' not found ({})", spec.keyword, spec.mode.name());
                    }
                    result.insert(spec.cells[0].clone(), value);
                }
                Values::Multi(values) => {
                    if values.is_empty() {
                        tracing::info!("'{}' not found ({})", spec.keyword, spec.mode.name());
                    }
                    let mut values = values.into_iter();
                    for cell in &spec.cells {
                        result.insert(cell.clone(), values.next());
                    }
                }
            }
        }

        result
    }
}

enum Values {
    Single(Option<String>),
    Multi(Vec<String>),
}

fn extract_values(text: &str, spec: &KeywordSpec) -> Values {
    let keyword = spec.keyword.as_str();
    match &spec.mode {
        ExtractionMode::Split => Values::Multi(split_after(text, keyword).unwrap_or_default()),
        ExtractionMode::UntilDot => Values::Single(until_dot(text, keyword)),
        ExtractionMode::UntilNewline => Values::Single(until_newline(text, keyword)),
        ExtractionMode::FirstNumberAfter => Values::Single(first_token_after(text, keyword)),
        ExtractionMode::TwoNumbersAfter => {
            Values::Multi(numbers_after(text, keyword, MAX_NUMBERS_AFTER).unwrap_or_default())
        }
        ExtractionMode::BetweenPhrases { start_phrase, end_phrase } => {
            match (start_phrase.as_deref(), end_phrase.as_deref()) {
                (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                    Values::Single(between_phrases(text, start, end))
                }
                // Nothing to anchor on, so every cell is a miss
                _ => Values::Multi(Vec::new()),
            }
        }
    }
}

/// Compiles `prefix + escaped literals + suffix` patterns. A pattern that fails to
/// compile (only possible for pathological keyword sizes) is treated as a miss.
fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Could not compile extraction pattern: {}", e);
            None
        }
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Byte offset just past the first occurrence of the keyword.
fn keyword_end(text: &str, keyword: &str) -> Option<usize> {
    text.find(keyword).map(|start| start + keyword.len())
}

/// Rest of the keyword's line (leading whitespace, including line breaks, skipped), split on whitespace.
pub fn split_after(text: &str, keyword: &str) -> Option<Vec<String>> {
    let re = compile(&format!(r"{}\s*([^\n]+)", regex::escape(keyword)))?;
    let captured = first_capture(&re, text)?;
    Some(captured.split_whitespace().map(str::to_string).collect())
}

/// Everything after the keyword up to and including the first `.` that is followed
/// by whitespace or the end of the text. Spans lines.
pub fn until_dot(text: &str, keyword: &str) -> Option<String> {
    let re = compile(&format!(r"(?s){}(.*?\.)(?:\s|$)", regex::escape(keyword)))?;
    first_capture(&re, text).map(|s| s.trim().to_string())
}

/// Everything after the keyword up to the next newline. A keyword on an
/// unterminated final line does not match.
pub fn until_newline(text: &str, keyword: &str) -> Option<String> {
    let re = compile(&format!(r"{}(.*?)\n", regex::escape(keyword)))?;
    first_capture(&re, text).map(|s| s.trim().to_string())
}

/// The first whitespace-delimited token after the keyword, verbatim.
pub fn first_token_after(text: &str, keyword: &str) -> Option<String> {
    let end = keyword_end(text, keyword)?;
    text[end..].split_whitespace().next().map(str::to_string)
}

/// Up to `limit` numeric tokens after the keyword, in their original spelling.
/// Returns `None` only when the keyword is absent.
pub fn numbers_after(text: &str, keyword: &str, limit: usize) -> Option<Vec<String>> {
    let end = keyword_end(text, keyword)?;

    let mut numbers = Vec::with_capacity(limit);
    let mut skip = 0;
    for token in text[end..].split_whitespace() {
        if numbers.len() == limit {
            break;
        }
        if skip > 0 {
            skip -= 1;
            continue;
        }
        if token == FOOTNOTE_MARKER {
            skip = FOOTNOTE_SKIP;
            continue;
        }
        if is_numeric_token(token) {
            numbers.push(token.to_string());
        }
    }
    Some(numbers)
}

/// Text between the first `start` and the next `end`, with line breaks turned into spaces.
pub fn between_phrases(text: &str, start: &str, end: &str) -> Option<String> {
    let re = compile(&format!(
        r"(?s){}(.*?){}",
        regex::escape(start),
        regex::escape(end)
    ))?;
    first_capture(&re, text).map(|s| s.trim().replace('\n', " ").trim().to_string())
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellRef;

    const BALANCE: &str = "BALANCE ABREVIADO\n\
        Denominación social: Construcciones Norte S.L.\n\
        NIF: B12345678\n\
        Ejercicio 2024\n\
        Objeto social: Construcción de edificios. Reformas\n\
        A) ACTIVO NO CORRIENTE Nota 5 6 1.234,56 (7,00)\n\
        Capital escriturado 3.000,00 3.000,00\n\
        Resultado del ejercicio\n  (12.450,10)   8.003,20\n\
        Observaciones:\n  Sin incidencias\n  relevantes\nFirma del administrador";

    fn cell(s: &str) -> CellRef {
        s.parse().unwrap()
    }

    fn spec(keyword: &str, mode: ExtractionMode, cells: &[&str]) -> KeywordSpec {
        KeywordSpec {
            keyword: keyword.to_string(),
            mode,
            cells: cells.iter().map(|c| cell(c)).collect(),
        }
    }

    fn run(spec: KeywordSpec, text: &str) -> ExtractionResult {
        let specs = [spec];
        KeywordExtractor::new(&specs).extract(text)
    }

    #[test]
    fn test_split_assigns_tokens_positionally() {
        let result = run(
            spec("Capital escriturado", ExtractionMode::Split, &["B10", "C10", "D10"]),
            BALANCE,
        );
        assert_eq!(result.get(&cell("B10")), Some("3.000,00"));
        assert_eq!(result.get(&cell("C10")), Some("3.000,00"));
        assert!(result.is_miss(&cell("D10")));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_split_crosses_line_break_after_keyword() {
        let values = split_after(BALANCE, "Resultado del ejercicio").unwrap();
        assert_eq!(values, vec!["(12.450,10)", "8.003,20"]);
    }

    #[test]
    fn test_until_dot_stops_at_period_followed_by_space() {
        // "S.L." has inner dots not followed by whitespace
        assert_eq!(
            until_dot(BALANCE, "Denominación social:").as_deref(),
            Some("Construcciones Norte S.L.")
        );
        assert_eq!(
            until_dot(BALANCE, "Objeto social:").as_deref(),
            Some("Construcción de edificios.")
        );
    }

    #[test]
    fn test_until_dot_accepts_end_of_text() {
        assert_eq!(until_dot("Nota final: cuentas auditadas.", "Nota final:").as_deref(), Some("cuentas auditadas."));
        assert_eq!(until_dot("Nota final: sin punto", "Nota final:"), None);
    }

    #[test]
    fn test_until_newline() {
        assert_eq!(until_newline(BALANCE, "NIF:").as_deref(), Some("B12345678"));
        assert_eq!(until_newline("Ejercicio 2024", "Ejercicio"), None);
    }

    #[test]
    fn test_first_token_after_is_not_validated() {
        assert_eq!(first_token_after(BALANCE, "Ejercicio").as_deref(), Some("2024"));
        assert_eq!(first_token_after(BALANCE, "NIF:").as_deref(), Some("B12345678"));
        assert_eq!(first_token_after("Total   ", "Total"), None);
    }

    #[test]
    fn test_two_numbers_skips_footnote_reference() {
        let text = "Total activo Nota 1 2 1.234,56 7,00 99";
        let result = run(
            spec("Total activo", ExtractionMode::TwoNumbersAfter, &["B20", "C20"]),
            text,
        );
        assert_eq!(result.get(&cell("B20")), Some("1.234,56"));
        assert_eq!(result.get(&cell("C20")), Some("7,00"));
    }

    #[test]
    fn test_two_numbers_keeps_parenthesized_original() {
        let values = numbers_after(BALANCE, "ACTIVO NO CORRIENTE", 2).unwrap();
        assert_eq!(values, vec!["1.234,56", "(7,00)"]);
    }

    #[test]
    fn test_two_numbers_skips_words_and_pads_with_misses() {
        let text = "Deudas a corto plazo euros 15,00 fin";
        let result = run(
            spec("Deudas a corto plazo", ExtractionMode::TwoNumbersAfter, &["B21", "C21", "D21"]),
            text,
        );
        assert_eq!(result.get(&cell("B21")), Some("15,00"));
        assert!(result.is_miss(&cell("C21")));
        assert!(result.is_miss(&cell("D21")));
    }

    #[test]
    fn test_between_phrases_collapses_newlines() {
        assert_eq!(
            between_phrases("Total:\n  42,00  \nEUR", "Total:", "EUR").as_deref(),
            Some("42,00")
        );
        assert_eq!(
            between_phrases(BALANCE, "Observaciones:", "Firma").as_deref(),
            Some("Sin incidencias   relevantes")
        );
    }

    #[test]
    fn test_between_phrases_requires_end_after_start() {
        assert_eq!(between_phrases("EUR 10 Total: 5", "Total:", "EUR"), None);
    }

    #[test]
    fn test_between_phrases_ignores_keyword_label() {
        let result = run(
            spec(
                "Importe",
                ExtractionMode::BetweenPhrases {
                    start_phrase: Some("Total:".to_string()),
                    end_phrase: Some("EUR".to_string()),
                },
                &["B30"],
            ),
            "Total: 42,00 EUR",
        );
        assert_eq!(result.get(&cell("B30")), Some("42,00"));
    }

    #[test]
    fn test_between_phrases_without_phrases_misses_every_cell() {
        let result = run(
            spec(
                "Total:",
                ExtractionMode::BetweenPhrases { start_phrase: Some("Total:".to_string()), end_phrase: None },
                &["B30", "C30"],
            ),
            "Total: 42,00 EUR",
        );
        assert_eq!(result.len(), 2);
        assert!(result.is_miss(&cell("B30")));
        assert!(result.is_miss(&cell("C30")));
    }

    #[test]
    fn test_absent_keyword_misses_for_every_mode() {
        let modes = [
            ExtractionMode::Split,
            ExtractionMode::UntilDot,
            ExtractionMode::UntilNewline,
            ExtractionMode::FirstNumberAfter,
            ExtractionMode::TwoNumbersAfter,
            ExtractionMode::BetweenPhrases {
                start_phrase: Some("Pasivo corriente".to_string()),
                end_phrase: Some("Total".to_string()),
            },
        ];

        for mode in modes {
            let multi = mode.is_multi_value();
            let result = run(spec("Pasivo corriente", mode, &["E1", "E2"]), BALANCE);
            assert!(result.is_miss(&cell("E1")));
            if multi {
                assert!(result.is_miss(&cell("E2")));
                assert_eq!(result.len(), 2);
            } else {
                assert_eq!(result.len(), 1);
            }
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Capital 100\nCapital 200\n";
        assert_eq!(first_token_after(text, "Capital").as_deref(), Some("100"));
        assert_eq!(until_newline(text, "Capital").as_deref(), Some("100"));
    }

    #[test]
    fn test_keyword_is_matched_literally() {
        let text = "Total (A+B): 1.500,00\nTotal AAB: 9";
        assert_eq!(first_token_after(text, "(A+B):").as_deref(), Some("1.500,00"));
        assert_eq!(until_newline(text, "Total (A+B):").as_deref(), Some("1.500,00"));
    }
}
