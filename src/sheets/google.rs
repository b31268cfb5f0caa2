use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::auth::TokenProvider;
use super::SheetBackend;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
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
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// The first worksheet of a Google spreadsheet, accessed over the REST API.
pub struct GoogleSheet {
    client: reqwest::Client,
    auth: TokenProvider,
    spreadsheet_id: String,
    sheet_title: String,
}

impl GoogleSheet {
    /// Resolve the spreadsheet (by id if given, otherwise by display name
    /// through Drive) and pick its first worksheet.
    pub async fn open(
        client: reqwest::Client,
        auth: TokenProvider,
        name: &str,
        spreadsheet_id: Option<&str>,
    ) -> Result<Self> {
        let mut sheet = Self {
            client,
            auth,
            spreadsheet_id: String::new(),
            sheet_title: String::new(),
        };

        sheet.spreadsheet_id = match spreadsheet_id {
            Some(id) => id.to_string(),
            None => sheet.find_by_name(name).await?,
        };
        sheet.sheet_title = sheet.first_sheet_title().await?;

        info!(
            "Opened spreadsheet '{}' ({}) worksheet '{}' as {}",
            name,
            sheet.spreadsheet_id,
            sheet.sheet_title,
            sheet.auth.client_email()
        );
        Ok(sheet)
    }

    async fn find_by_name(&self, name: &str) -> Result<String> {
        let mut url = Url::parse(DRIVE_FILES)?;
        url.query_pairs_mut()
            .append_pair("q", &drive_query(name))
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        let list: DriveFileList = self.get_json(url).await.context("Drive lookup failed")?;
        let file = list.files.into_iter().next().with_context(|| {
            format!(
                "Spreadsheet '{}' not found; is it shared with the service account?",
                name
            )
        })?;

        debug!("Drive resolved '{}' to {}", file.name, file.id);
        Ok(file.id)
    }

    async fn first_sheet_title(&self) -> Result<String> {
        let mut url = spreadsheet_url(SHEETS_BASE, &self.spreadsheet_id)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(title,index)");

        let meta: SpreadsheetMeta = self
            .get_json(url)
            .await
            .context("Failed to read spreadsheet metadata")?;
        meta.sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .context("Spreadsheet has no worksheets")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request to Google API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google API error ({}): {}", status, error_body);
        }

        response
            .json()
            .await
            .context("Failed to parse Google API response")
    }
}

#[async_trait]
impl SheetBackend for GoogleSheet {
    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>> {
        let range = quote_title(&self.sheet_title);
        let url = values_url(SHEETS_BASE, &self.spreadsheet_id, &range)?;
        let values: ValueRange = self.get_json(url).await?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_string).collect())
            .collect())
    }

    async fn append_row(&self, row: &[String]) -> Result<()> {
        let range = format!("{}!A1:append", quote_title(&self.sheet_title));
        let mut url = values_url(SHEETS_BASE, &self.spreadsheet_id, &range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "majorDimension": "ROWS", "values": [row] }))
            .send()
            .await
            .context("Failed to send append request to Sheets API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets API error ({}): {}", status, error_body);
        }

        debug!("Appended {} cell(s) to '{}'", row.len(), self.sheet_title);
        Ok(())
    }
}

/// A1-notation sheet name: single-quoted with embedded quotes doubled.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

fn spreadsheet_url(base: &str, spreadsheet_id: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Invalid API base URL: {}", base))?
        .push(spreadsheet_id);
    Ok(url)
}

fn values_url(base: &str, spreadsheet_id: &str, range: &str) -> Result<Url> {
    let mut url = spreadsheet_url(base, spreadsheet_id)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Invalid API base URL: {}", base))?
        .push("values")
        .push(range);
    Ok(url)
}

fn cell_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_title_doubles_quotes() {
        assert_eq!(quote_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_title("Bob's log"), "'Bob''s log'");
    }

    #[test]
    fn test_drive_query_escapes_name() {
        assert_eq!(
            drive_query("MK-12 Logistics Database"),
            "name = 'MK-12 Logistics Database' and mimeType = \
             'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
        assert!(drive_query("it's").starts_with(r"name = 'it\'s'"));
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = values_url(SHEETS_BASE, "abc123", "'Data Log'!A1:append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Data%20Log'!A1:append"
        );
    }

    #[test]
    fn test_spreadsheet_url() {
        let url = spreadsheet_url(SHEETS_BASE, "abc123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123"
        );
    }

    #[test]
    fn test_value_range_without_values_is_empty() {
        let parsed: ValueRange =
            serde_json::from_str(r#"{"range":"'Sheet1'!A1:Z1000","majorDimension":"ROWS"}"#)
                .unwrap();
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn test_cells_become_strings() {
        assert_eq!(cell_string(json!("Bolt")), "Bolt");
        assert_eq!(cell_string(json!(3)), "3");
        assert_eq!(cell_string(Value::Null), "");
    }

    #[test]
    fn test_first_sheet_by_index() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"sheets":[{"properties":{"title":"Archive","index":1}},{"properties":{"title":"Live"}}]}"#,
        )
        .unwrap();
        let first = meta
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .unwrap();
        assert_eq!(first.properties.title, "Live");
    }
}
