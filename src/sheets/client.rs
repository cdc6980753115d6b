// src/sheets/client.rs
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::config::{CellRef, SheetTarget, ValueInputOption};
use crate::sheets::auth::{fetch_access_token, ServiceAccountKey};
use crate::sheets::value::CellValue;
use crate::sheets::writer::CellSink;
use crate::utils::error::SheetsError;

const USER_AGENT: &str = concat!("balance_extractor/", env!("CARGO_PKG_VERSION"));
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Base URLs of the Google APIs. Overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sheets_base: String,
    pub drive_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sheets_base: "https://sheets.googleapis.com/v4".to_string(),
            drive_base: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Authenticated Google Sheets client.
pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
    endpoints: Endpoints,
    value_input_option: ValueInputOption,
}

/// Creates a reqwest client configured for Google API interaction.
fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

impl SheetsClient {
    /// Authenticates with the service account and returns a ready client.
    pub async fn connect(
        key: &ServiceAccountKey,
        endpoints: Endpoints,
        value_input_option: ValueInputOption,
    ) -> Result<Self, SheetsError> {
        let http = build_http_client()?;
        let token = fetch_access_token(&http, key).await?;
        Ok(Self {
            http,
            token,
            endpoints,
            value_input_option,
        })
    }

    fn url(&self, base: &str, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(base)
            .map_err(|e| SheetsError::Parse(format!("invalid base URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse(format!("base URL {} cannot have a path", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Looks up a spreadsheet id by its exact title through the Drive API.
    pub async fn find_spreadsheet_id(&self, name: &str) -> Result<String, SheetsError> {
        let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escaped, SPREADSHEET_MIME
        );
        let url = self.url(&self.endpoints.drive_base, &["files"])?;

        tracing::debug!("Looking up spreadsheet '{}' on Drive", name);
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, url, response).await);
        }

        let list: DriveFileList = response
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("Drive file list: {}", e)))?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| SheetsError::SpreadsheetNotFound(name.to_string()))
    }

    /// Resolves the spreadsheet and checks that the worksheet exists.
    pub async fn open_worksheet(&self, target: &SheetTarget) -> Result<Worksheet<'_>, SheetsError> {
        let spreadsheet_id = match &target.spreadsheet_id {
            Some(id) => id.clone(),
            None => self.find_spreadsheet_id(&target.sheet_name).await?,
        };
        tracing::info!("Opening spreadsheet '{}' ({})", target.sheet_name, spreadsheet_id);

        let url = self.url(&self.endpoints.sheets_base, &["spreadsheets", spreadsheet_id.as_str()])?;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SheetsError::SpreadsheetNotFound(spreadsheet_id));
        }
        if !status.is_success() {
            return Err(status_error(status, url, response).await);
        }

        let meta: SpreadsheetMeta = response
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("spreadsheet metadata: {}", e)))?;

        if !meta.sheets.iter().any(|s| s.properties.title == target.worksheet_name) {
            return Err(SheetsError::WorksheetNotFound {
                spreadsheet: spreadsheet_id,
                worksheet: target.worksheet_name.clone(),
            });
        }

        Ok(Worksheet {
            client: self,
            spreadsheet_id,
            title: target.worksheet_name.clone(),
        })
    }
}

async fn status_error(status: StatusCode, url: Url, response: reqwest::Response) -> SheetsError {
    tracing::error!("HTTP error status: {} for URL: {}", status, url);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return SheetsError::Auth { status, body };
    }
    SheetsError::Http {
        status,
        url: url.to_string(),
    }
}

/// A worksheet inside an opened spreadsheet.
pub struct Worksheet<'c> {
    client: &'c SheetsClient,
    spreadsheet_id: String,
    title: String,
}

impl Worksheet<'_> {
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// A1 range for one cell of this worksheet, e.g. `'Balance 2024'!B10`.
    pub fn range_for(&self, cell: &CellRef) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), cell)
    }

    /// Writes a single value with one `values.update` call.
    pub async fn update_cell(&self, cell: &CellRef, value: &CellValue) -> Result<(), SheetsError> {
        let client = self.client;
        let range = self.range_for(cell);
        let url = client.url(
            &client.endpoints.sheets_base,
            &["spreadsheets", self.spreadsheet_id.as_str(), "values", range.as_str()],
        )?;

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value.to_json()]],
        });

        let response = client
            .http
            .put(url)
            .bearer_auth(&client.token)
            .query(&[("valueInputOption", client.value_input_option.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Write to {} could not be sent: {}", range, e);
                SheetsError::WriteTransport {
                    cell: cell.to_string(),
                    source: e,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Write to {} failed with status {}", range, status);
            return Err(SheetsError::WriteFailed {
                cell: cell.to_string(),
                status,
                body,
            });
        }

        tracing::debug!("Wrote {} = {:?}", range, value);
        Ok(())
    }
}

impl CellSink for Worksheet<'_> {
    async fn write_cell(&mut self, cell: &CellRef, value: &CellValue) -> Result<(), SheetsError> {
        self.update_cell(cell, value).await
    }
}
