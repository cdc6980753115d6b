// src/config/mod.rs
pub mod models;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::utils::error::ConfigError;
pub use models::{
    AppConfig, CellRef, ExtractionMode, KeywordSpec, SheetTarget, ValueInputOption,
};
use models::{RawConfig, RawKeywordEntry};

/// Controls how strictly keyword entries are validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Accept `between_phrases` entries without both phrases; they extract as misses.
    pub lenient: bool,
}

/// Reads and validates the configuration file.
pub fn load_config(path: &Path, options: LoadOptions) -> Result<AppConfig, ConfigError> {
    tracing::info!("Loading configuration from {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_config(&content, options)
}

/// Parses configuration JSON into typed keyword specs, rejecting malformed entries.
pub fn parse_config(json: &str, options: LoadOptions) -> Result<AppConfig, ConfigError> {
    let raw: RawConfig = serde_json::from_str(json)?;

    let identifier_cell: CellRef = raw.identifier_cell.parse()?;

    let mut keywords = Vec::with_capacity(raw.keywords.len());
    for (keyword, entry) in raw.keywords {
        keywords.push(build_spec(keyword, entry, options)?);
    }

    check_unique_cells(&keywords, &identifier_cell)?;

    let spreadsheet_id = raw
        .spreadsheet_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    tracing::debug!("Loaded {} keyword specs", keywords.len());

    Ok(AppConfig {
        keywords,
        sheet: SheetTarget {
            sheet_name: raw.sheet_name,
            worksheet_name: raw.worksheet_name,
            spreadsheet_id,
        },
        identifier_cell,
        not_found_text: raw.not_found_text,
        value_input_option: raw.value_input_option,
    })
}

fn build_spec(keyword: String, entry: RawKeywordEntry, options: LoadOptions) -> Result<KeywordSpec, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidKeyword {
        keyword: keyword.clone(),
        reason: reason.to_string(),
    };

    if keyword.is_empty() {
        return Err(invalid("keyword must not be empty"));
    }
    if entry.cells.is_empty() {
        return Err(invalid("at least one target cell is required"));
    }

    let cells = entry
        .cells
        .iter()
        .map(|c| c.parse::<CellRef>())
        .collect::<Result<Vec<_>, _>>()?;

    // Empty phrases count as absent
    let start_phrase = entry.start_phrase.filter(|p| !p.is_empty());
    let end_phrase = entry.end_phrase.filter(|p| !p.is_empty());

    let mode = match entry.mode.as_deref().unwrap_or("split") {
        "split" | "implicit_split" => ExtractionMode::Split,
        "until_dot" => ExtractionMode::UntilDot,
        "until_newline" => ExtractionMode::UntilNewline,
        "first_number_after" => ExtractionMode::FirstNumberAfter,
        "two_numbers_after" => ExtractionMode::TwoNumbersAfter,
        "between_phrases" => {
            if start_phrase.is_none() || end_phrase.is_none() {
                if !options.lenient {
                    return Err(invalid("between_phrases requires start_phrase and end_phrase"));
                }
                tracing::warn!(
                    "Keyword '{}' uses between_phrases without both phrases; its cells will be left as not found",
                    keyword
                );
            }
            ExtractionMode::BetweenPhrases {
                start_phrase: start_phrase.clone(),
                end_phrase: end_phrase.clone(),
            }
        }
        other => return Err(invalid(&format!("unknown mode '{}'", other))),
    };

    if !matches!(mode, ExtractionMode::BetweenPhrases { .. })
        && (start_phrase.is_some() || end_phrase.is_some())
    {
        tracing::warn!("Keyword '{}' sets phrases that mode {} ignores", keyword, mode.name());
    }
    if !mode.is_multi_value() && cells.len() > 1 {
        tracing::warn!(
            "Keyword '{}' lists {} cells but mode {} only fills {}",
            keyword,
            cells.len(),
            mode.name(),
            cells[0]
        );
    }

    Ok(KeywordSpec { keyword, mode, cells })
}

fn check_unique_cells(specs: &[KeywordSpec], identifier_cell: &CellRef) -> Result<(), ConfigError> {
    const IDENTIFIER_OWNER: &str = "<identifier>";

    let mut owners: HashMap<&CellRef, &str> = HashMap::new();
    owners.insert(identifier_cell, IDENTIFIER_OWNER);

    for spec in specs {
        for cell in spec.output_cells() {
            if let Some(first) = owners.insert(cell, &spec.keyword) {
                return Err(ConfigError::DuplicateCell {
                    cell: cell.to_string(),
                    first: first.to_string(),
                    second: spec.keyword.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::KeywordExtractor;

    const SAMPLE: &str = r#"{
        "sheet_name": "Balances 2024",
        "worksheet_name": "BSC",
        "keywords": {
            "Denominación social:": { "cells": ["B5"], "mode": "until_newline" },
            "Total activo": { "cells": ["C20", "D20"], "mode": "two_numbers_after" },
            "Capital": { "cells": ["c21", "D21"] },
            "Observaciones": {
                "cells": ["B40"],
                "mode": "between_phrases",
                "start_phrase": "Observaciones:",
                "end_phrase": "Firma"
            }
        }
    }"#;

    #[test]
    fn test_parse_sample_config() {
        let config = parse_config(SAMPLE, LoadOptions::default()).unwrap();

        assert_eq!(config.sheet.sheet_name, "Balances 2024");
        assert_eq!(config.sheet.worksheet_name, "BSC");
        assert_eq!(config.sheet.spreadsheet_id, None);
        assert_eq!(config.identifier_cell.as_str(), "R10");
        assert_eq!(config.not_found_text, "No encontrado");
        assert_eq!(config.value_input_option, ValueInputOption::Raw);
        assert_eq!(config.keywords.len(), 4);

        let capital = config.keywords.iter().find(|k| k.keyword == "Capital").unwrap();
        assert_eq!(capital.mode, ExtractionMode::Split);
        assert_eq!(capital.cells[0].as_str(), "C21");

        let obs = config.keywords.iter().find(|k| k.keyword == "Observaciones").unwrap();
        assert_eq!(
            obs.mode,
            ExtractionMode::BetweenPhrases {
                start_phrase: Some("Observaciones:".to_string()),
                end_phrase: Some("Firma".to_string()),
            }
        );
    }

    #[test]
    fn test_optional_fields() {
        let json = r#"{
            "sheet_name": "S", "worksheet_name": "W",
            "spreadsheet_id": " 1AbC ",
            "identifier_cell": "b10",
            "not_found_text": "N/A",
            "value_input_option": "USER_ENTERED",
            "keywords": { "Fecha": { "cells": ["C3"], "mode": "implicit_split" } }
        }"#;
        let config = parse_config(json, LoadOptions::default()).unwrap();
        assert_eq!(config.sheet.spreadsheet_id.as_deref(), Some("1AbC"));
        assert_eq!(config.identifier_cell.as_str(), "B10");
        assert_eq!(config.not_found_text, "N/A");
        assert_eq!(config.value_input_option, ValueInputOption::UserEntered);
        assert_eq!(config.keywords[0].mode, ExtractionMode::Split);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "Fecha": { "cells": ["C3"], "mode": "until_comma" } } }"#;
        let err = parse_config(json, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeyword { ref keyword, .. } if keyword == "Fecha"));
    }

    #[test]
    fn test_rejects_empty_cells() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "Fecha": { "cells": [] } } }"#;
        assert!(matches!(
            parse_config(json, LoadOptions::default()),
            Err(ConfigError::InvalidKeyword { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_cell() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "Fecha": { "cells": ["10B"] } } }"#;
        assert!(matches!(
            parse_config(json, LoadOptions::default()),
            Err(ConfigError::InvalidCell(ref c)) if c == "10B"
        ));
    }

    #[test]
    fn test_between_phrases_requires_phrases_unless_lenient() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "Notas": { "cells": ["B9"], "mode": "between_phrases", "start_phrase": "Notas", "end_phrase": "" } } }"#;

        assert!(matches!(
            parse_config(json, LoadOptions::default()),
            Err(ConfigError::InvalidKeyword { .. })
        ));

        let config = parse_config(json, LoadOptions { lenient: true }).unwrap();
        assert_eq!(
            config.keywords[0].mode,
            ExtractionMode::BetweenPhrases {
                start_phrase: Some("Notas".to_string()),
                end_phrase: None,
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_target_cells() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": {
                "Activo": { "cells": ["B1", "C1"], "mode": "two_numbers_after" },
                "Pasivo": { "cells": ["c1"], "mode": "first_number_after" }
            } }"#;
        let err = parse_config(json, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCell { ref cell, .. } if cell == "C1"));
    }

    #[test]
    fn test_rejects_cell_clashing_with_identifier() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "NIF": { "cells": ["R10"], "mode": "until_newline" } } }"#;
        let err = parse_config(json, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCell { ref first, .. } if first == "<identifier>"));
    }

    #[test]
    fn test_unused_extra_cells_do_not_clash() {
        // Single-value modes only write their first cell
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": {
                "Fecha": { "cells": ["B1", "C1"], "mode": "until_newline" },
                "Lugar": { "cells": ["C1"], "mode": "until_newline" }
            } }"#;
        assert!(parse_config(json, LoadOptions::default()).is_ok());
    }

    #[test]
    fn test_lenient_between_phrases_cells_are_checked_for_clashes() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": {
                "Capital": { "cells": ["C1"], "mode": "first_number_after" },
                "Notas": { "cells": ["B1", "C1"], "mode": "between_phrases", "start_phrase": "x" }
            } }"#;
        let err = parse_config(json, LoadOptions { lenient: true }).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCell { ref cell, .. } if cell == "C1"));

        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": { "Notas": { "cells": ["B1", "R10"], "mode": "between_phrases" } } }"#;
        let err = parse_config(json, LoadOptions { lenient: true }).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCell { ref first, .. } if first == "<identifier>"));
    }

    #[test]
    fn test_lenient_between_phrases_misses_only_its_own_cells() {
        let json = r#"{ "sheet_name": "S", "worksheet_name": "W",
            "keywords": {
                "Capital": { "cells": ["C1"], "mode": "first_number_after" },
                "Notas": { "cells": ["B1", "B2"], "mode": "between_phrases", "start_phrase": "x" }
            } }"#;
        let config = parse_config(json, LoadOptions { lenient: true }).unwrap();

        let results = KeywordExtractor::new(&config.keywords).extract("Capital 500 EUR");
        let cells: Vec<(String, Option<String>)> = results
            .iter()
            .map(|(cell, value)| (cell.to_string(), value.clone()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("B1".to_string(), None),
                ("B2".to_string(), None),
                ("C1".to_string(), Some("500".to_string())),
            ]
        );
    }

    #[test]
    fn test_missing_required_field_is_json_error() {
        let json = r#"{ "sheet_name": "S", "keywords": {} }"#;
        assert!(matches!(
            parse_config(json, LoadOptions::default()),
            Err(ConfigError::Json(_))
        ));
    }
}
