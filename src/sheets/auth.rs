// src/sheets/auth.rs
use std::fs;
use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::utils::error::SheetsError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Write access to spreadsheets plus read access to Drive for the lookup by name.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// The fields of a Google service-account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        tracing::info!("Reading service account credentials from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            SheetsError::Credentials(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json).map_err(|e| SheetsError::Credentials(e.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Builds the signed RS256 assertion for the JWT bearer grant.
pub fn build_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, SheetsError> {
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: SCOPES.join(" "),
        aud: key.token_uri.clone(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let header = Header {
        kid: key.private_key_id.clone(),
        ..Header::new(Algorithm::RS256)
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;

    Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
}

/// Exchanges a signed assertion for an OAuth access token.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, SheetsError> {
    let assertion = build_assertion(key, chrono::Utc::now().timestamp())?;

    tracing::debug!("Requesting access token for {} from {}", key.client_email, key.token_uri);
    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Token request rejected with status {}", status);
        return Err(SheetsError::Auth { status, body });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SheetsError::Parse(format!("token response: {}", e)))?;

    tracing::info!(
        "Authenticated as {} (token valid for {}s)",
        key.client_email,
        token.expires_in.unwrap_or(0)
    );
    Ok(token.access_token)
}
