// src/utils/error.rs
use thiserror::Error;

// One error type per concern, converted into AppError at the top level
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid keyword entry '{keyword}': {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    #[error("Invalid cell reference '{0}'")]
    InvalidCell(String),

    #[error("Cell {cell} is targeted by both '{first}' and '{second}'")]
    DuplicateCell {
        cell: String,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Could not open PDF document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode PDF document: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not read service account credentials: {0}")]
    Credentials(String),

    #[error("Could not sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Authentication rejected ({status}): {body}")]
    Auth {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP error {status} from {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("Worksheet '{worksheet}' not found in spreadsheet {spreadsheet}")]
    WorksheetNotFound {
        spreadsheet: String,
        worksheet: String,
    },

    #[error("Write to {cell} failed with status {status}: {body}")]
    WriteFailed {
        cell: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Write to {cell} failed: {source}")]
    WriteTransport {
        cell: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse Google API response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document access failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("Spreadsheet interaction failed: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
