use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_auth::project::Config as AuthConfig;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use google_cloud_token::{TokenSource, TokenSourceProvider};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::SheetsApi;
use crate::source::Cell;

/// Credential scope is restricted to spreadsheet read/write.
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];
const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Destination spreadsheet identity plus the service-account credential
/// payload, environment-scoped (see `config`).
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials_json: String,
}

/// Google Sheets REST v4 client bound to one spreadsheet.
pub struct SheetsClient {
    http: Client,
    token_source: Arc<dyn TokenSource>,
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Cell>>,
}

impl SheetsClient {
    pub async fn connect(config: SheetsConfig) -> Result<Self> {
        let credentials = CredentialsFile::new_from_str(&config.credentials_json)
            .await
            .context("parsing google service account credentials")?;
        let auth_config = AuthConfig::default().with_scopes(SCOPES);
        let provider =
            DefaultTokenSourceProvider::new_with_credentials(auth_config, Box::new(credentials))
                .await
                .context("building google token source")?;
        debug!(spreadsheet = %config.spreadsheet_id, "sheets client ready");
        Ok(Self {
            http: Client::new(),
            token_source: provider.token_source(),
            spreadsheet_id: config.spreadsheet_id,
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!("{BASE_URL}/{}/values/{range}", self.spreadsheet_id)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let token = self
            .token_source
            .token()
            .await
            .map_err(|err| anyhow!("fetching sheets access token: {err}"))?;
        let response = request
            .header(AUTHORIZATION, token)
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;
        response
            .error_for_status()
            .with_context(|| format!("{what}: rejected by the sheets api"))
    }
}

impl SheetsApi for SheetsClient {
    async fn sheet_titles(&self) -> Result<Vec<String>> {
        let url = format!("{BASE_URL}/{}", self.spreadsheet_id);
        let request = self
            .http
            .get(url)
            .query(&[("fields", "sheets.properties.title")]);
        let meta: SpreadsheetMeta = self
            .send(request, "listing sheet tabs")
            .await?
            .json()
            .await
            .context("decoding spreadsheet metadata")?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<()> {
        let url = format!("{BASE_URL}/{}:batchUpdate", self.spreadsheet_id);
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        self.send(self.http.post(url).json(&body), "adding sheet tab")
            .await?;
        Ok(())
    }

    async fn clear(&self, range: &str) -> Result<()> {
        let url = format!("{}:clear", self.values_url(range));
        self.send(self.http.post(url).json(&json!({})), "clearing range")
            .await?;
        Ok(())
    }

    async fn update(&self, range: &str, values: &[Vec<Cell>]) -> Result<()> {
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        let request = self
            .http
            .put(self.values_url(range))
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(request, "writing range").await?;
        Ok(())
    }

    async fn append(&self, range: &str, values: &[Vec<Cell>]) -> Result<()> {
        let url = format!("{}:append", self.values_url(range));
        let request = self
            .http
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": values }));
        self.send(request, "appending rows").await?;
        Ok(())
    }

    async fn read(&self, range: &str) -> Result<Vec<Vec<Cell>>> {
        let request = self.http.get(self.values_url(range));
        let value_range: ValueRange = self
            .send(request, "reading range")
            .await?
            .json()
            .await
            .context("decoding range values")?;
        Ok(value_range.values)
    }
}
