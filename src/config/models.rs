// src/config/models.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::utils::error::ConfigError;

pub const DEFAULT_IDENTIFIER_CELL: &str = "R10";
pub const DEFAULT_NOT_FOUND_TEXT: &str = "No encontrado";

// A1 notation: column letters followed by a row number, optional `$` anchors
static CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]{0,6})$").expect("Failed to compile CELL_RE")
});

/// A single spreadsheet cell address such as `B10`, stored upper-case without `$` anchors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef(String);

impl CellRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CellRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = CELL_RE
            .captures(trimmed)
            .ok_or_else(|| ConfigError::InvalidCell(s.to_string()))?;
        Ok(CellRef(format!("{}{}", caps[1].to_uppercase(), &caps[2])))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Extraction strategy applied to one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Rest of the keyword's line, split on whitespace across the cells.
    Split,
    /// Up to and including the next period followed by whitespace or end of text.
    UntilDot,
    /// Up to the next newline.
    UntilNewline,
    /// First whitespace-delimited token after the keyword.
    FirstNumberAfter,
    /// First two numeric tokens after the keyword, skipping `Nota` references.
    TwoNumbersAfter,
    /// Text between two phrases. The keyword is only a label here.
    BetweenPhrases {
        start_phrase: Option<String>,
        end_phrase: Option<String>,
    },
}

impl ExtractionMode {
    /// Whether the mode fills every configured cell or only the first one.
    pub fn is_multi_value(&self) -> bool {
        matches!(self, ExtractionMode::Split | ExtractionMode::TwoNumbersAfter)
    }

    /// A between_phrases mode missing a phrase: every cell is written as a miss.
    pub fn is_unanchored(&self) -> bool {
        match self {
            ExtractionMode::BetweenPhrases {
                start_phrase,
                end_phrase,
            } => !matches!(
                (start_phrase.as_deref(), end_phrase.as_deref()),
                (Some(start), Some(end)) if !start.is_empty() && !end.is_empty()
            ),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionMode::Split => "split",
            ExtractionMode::UntilDot => "until_dot",
            ExtractionMode::UntilNewline => "until_newline",
            ExtractionMode::FirstNumberAfter => "first_number_after",
            ExtractionMode::TwoNumbersAfter => "two_numbers_after",
            ExtractionMode::BetweenPhrases { .. } => "between_phrases",
        }
    }
}

/// One keyword and where its values go.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSpec {
    pub keyword: String,
    pub mode: ExtractionMode,
    pub cells: Vec<CellRef>, // never empty
}

impl KeywordSpec {
    /// The cells this spec can actually write to.
    pub fn output_cells(&self) -> &[CellRef] {
        if self.mode.is_multi_value() || self.mode.is_unanchored() {
            &self.cells
        } else {
            &self.cells[..1]
        }
    }
}

/// How the Sheets API should interpret written values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ValueInputOption {
    #[default]
    #[serde(rename = "RAW")]
    Raw,
    #[serde(rename = "USER_ENTERED")]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// Spreadsheet and worksheet the results are written to.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTarget {
    pub sheet_name: String,
    pub worksheet_name: String,
    pub spreadsheet_id: Option<String>,
}

/// Fully validated run configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub keywords: Vec<KeywordSpec>,
    pub sheet: SheetTarget,
    pub identifier_cell: CellRef,
    pub not_found_text: String,
    pub value_input_option: ValueInputOption,
}

// --- Raw file layout ---

#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub keywords: BTreeMap<String, RawKeywordEntry>,
    pub sheet_name: String,
    pub worksheet_name: String,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_identifier_cell")]
    pub identifier_cell: String,
    #[serde(default = "default_not_found_text")]
    pub not_found_text: String,
    #[serde(default)]
    pub value_input_option: ValueInputOption,
}

#[derive(Debug, Deserialize)]
pub struct RawKeywordEntry {
    #[serde(default)]
    pub cells: Vec<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub start_phrase: Option<String>,
    #[serde(default)]
    pub end_phrase: Option<String>,
}

fn default_identifier_cell() -> String {
    DEFAULT_IDENTIFIER_CELL.to_string()
}

fn default_not_found_text() -> String {
    DEFAULT_NOT_FOUND_TEXT.to_string()
}
