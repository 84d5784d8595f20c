//! Google Sheets row store: Sheets API v4 over plain REST.
//!
//! Reads the whole lead tab with `values.get` and writes status cells with
//! `values:batchUpdate`. The first row of the tab is the header; columns are
//! addressed by header name, so the sheet's column order does not matter.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::SheetsConfig;
use crate::error::SourceError;
use crate::leads::{Row, RowRef};
use crate::source::RowStore;
use crate::util::truncate;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheet row number of the first data row (row 1 is the header).
const FIRST_DATA_ROW: u64 = 2;

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets-backed `RowStore`.
pub struct GoogleSheetsStore {
    config: SheetsConfig,
    base_url: String,
    client: reqwest::Client,
    /// Header row from the most recent read, used to resolve write columns.
    header: RwLock<Option<Vec<String>>>,
}

impl GoogleSheetsStore {
    pub fn new(config: SheetsConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            base_url: SHEETS_API_BASE.to_string(),
            client,
            header: RwLock::new(None),
        })
    }

    /// Point the store at a different API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `/{sheet_id}/{method}` under the API root.
    fn api_url(&self, method: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::Http(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Http("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(&self.config.sheet_id)
            .push(method);
        Ok(url)
    }

    fn values_url(&self, range: &str) -> Result<Url, SourceError> {
        let mut url = self.api_url("values")?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Http("API base URL cannot carry a path".into()))?
            .push(range);
        Ok(url)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SourceError> {
        let resp = self
            .client
            .get(self.values_url(range)?)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let resp = self.check_status(resp).await?;
        let body: ValueRange = resp.json().await.map_err(|e| SourceError::InvalidResponse {
            name: self.name().into(),
            reason: e.to_string(),
        })?;
        Ok(body.values)
    }

    /// Map non-2xx responses to errors, keeping the body for diagnostics.
    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::AuthFailed {
                name: self.name().into(),
                reason: format!("{status}: {}", truncate(&body, 200)),
            });
        }
        Err(SourceError::Http(format!("{status}: {}", truncate(&body, 200))))
    }

    async fn remember_header(&self, header: Vec<String>) {
        *self.header.write().await = Some(header);
    }

    /// Header from the last fetch, or fetched on demand.
    async fn header(&self) -> Result<Vec<String>, SourceError> {
        if let Some(header) = self.header.read().await.as_ref() {
            return Ok(header.clone());
        }
        let range = format!("{}!1:1", quote_tab(&self.config.tab));
        let header = normalize_header(
            self.get_values(&range)
                .await?
                .into_iter()
                .next()
                .unwrap_or_default(),
        );
        self.remember_header(header.clone()).await;
        Ok(header)
    }
}

#[async_trait]
impl RowStore for GoogleSheetsStore {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
        let mut values = self.get_values(&quote_tab(&self.config.tab)).await?.into_iter();

        let Some(header) = values.next() else {
            debug!(tab = %self.config.tab, "Sheet is empty");
            return Ok(Vec::new());
        };
        let header = normalize_header(header);
        self.remember_header(header.clone()).await;

        Ok(values
            .enumerate()
            .map(|(i, cells)| row_from_values(&header, FIRST_DATA_ROW + i as u64, cells))
            .collect())
    }

    async fn update_row(&self, row: RowRef, fields: &[(&str, String)]) -> Result<(), SourceError> {
        let header = self.header().await?;
        let tab = quote_tab(&self.config.tab);

        let mut data = Vec::with_capacity(fields.len());
        for (column, value) in fields {
            match header.iter().position(|h| h == column) {
                Some(index) => data.push(serde_json::json!({
                    "range": format!("{tab}!{}{}", column_letter(index), row.row_number()),
                    "values": [[value]],
                })),
                None => warn!(column = %column, "Column not in sheet header, skipping"),
            }
        }

        if data.is_empty() {
            return Err(SourceError::MissingColumns {
                row: row.row_number(),
                fields: fields
                    .iter()
                    .map(|(c, _)| *c)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let body = serde_json::json!({
            "valueInputOption": "RAW",
            "data": data,
        });

        let resp = self
            .client
            .post(self.api_url("values:batchUpdate")?)
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        self.check_status(resp).await?;
        Ok(())
    }
}

fn normalize_header(header: Vec<String>) -> Vec<String> {
    header.into_iter().map(|h| h.trim().to_string()).collect()
}

/// Zip one value row with the header. The API drops trailing empty cells,
/// so short rows simply lack those columns.
fn row_from_values(header: &[String], row_number: u64, cells: Vec<String>) -> Row {
    let mut row = Row::new(row_number);
    for (column, value) in header.iter().zip(cells) {
        if !column.is_empty() {
            row.cells.insert(column.clone(), value);
        }
    }
    row
}

/// Quote a tab name for A1 notation (`'My Leads'`).
fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Zero-based column index to A1 letters: 0 → A, 25 → Z, 26 → AA.
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::leads::model::columns;

    fn config() -> SheetsConfig {
        SheetsConfig {
            sheet_id: "sheet-1".into(),
            access_token: SecretString::from("tok".to_string()),
            tab: "Leads".into(),
            request_timeout: Duration::from_secs(5),
        }
    }

    async fn store_for(server: &MockServer) -> GoogleSheetsStore {
        GoogleSheetsStore::new(config())
            .unwrap()
            .with_base_url(format!("{}/v4/spreadsheets", server.uri()))
    }

    fn sheet_body() -> serde_json::Value {
        serde_json::json!({
            "range": "Leads!A1:H3",
            "majorDimension": "ROWS",
            "values": [
                ["ID", "Name", "Phone", "Email", "Interest", "Status", "Notes", "Last Updated"],
                ["A", "Ann", "+15550000001", "ann@example.com", "solar"],
                ["", "Bo", "+15550000002", "", "", "Contacted", "Sent", "2026-01-01"]
            ]
        })
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(7), "H");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn tab_quoting() {
        assert_eq!(quote_tab("Leads"), "'Leads'");
        assert_eq!(quote_tab("Bob's leads"), "'Bob''s leads'");
    }

    #[test]
    fn short_rows_are_zipped_with_header() {
        let header = normalize_header(vec![" ID ".into(), "Name".into(), "Status".into()]);
        let row = row_from_values(&header, 4, vec!["7".into(), "Cy".into()]);
        assert_eq!(row.row_number, 4);
        assert_eq!(row.get(columns::ID), Some("7"));
        assert_eq!(row.get(columns::NAME), Some("Cy"));
        assert_eq!(row.get(columns::STATUS), None);
    }

    #[tokio::test]
    async fn fetch_rows_numbers_rows_from_two() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.*Leads.*$"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
            .mount(&server)
            .await;

        let rows = store_for(&server).await.fetch_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get(columns::NAME), Some("Ann"));
        assert_eq!(rows[0].get(columns::STATUS), None);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].get(columns::STATUS), Some("Contacted"));
    }

    #[tokio::test]
    async fn fetch_rows_empty_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Leads!A1:Z1000",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        let rows = store_for(&server).await.fetch_rows().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = store_for(&server).await.fetch_rows().await.unwrap_err();
        assert!(matches!(err, SourceError::AuthFailed { .. }));
    }

    #[tokio::test]
    async fn server_error_maps_to_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let err = store_for(&server).await.fetch_rows().await.unwrap_err();
        assert!(matches!(err, SourceError::Http(ref m) if m.contains("backend down")));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = store_for(&server).await.fetch_rows().await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn update_row_writes_cells_by_header_position() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-1/values:batchUpdate$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        store.fetch_rows().await.unwrap();
        store
            .update_row(
                RowRef::new(2),
                &[
                    (columns::STATUS, "Contacted".to_string()),
                    (columns::NOTES, "Sent".to_string()),
                ],
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let post = requests
            .iter()
            .find(|r| r.method.as_str() == "POST")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
        assert_eq!(body["valueInputOption"], "RAW");
        assert_eq!(body["data"][0]["range"], "'Leads'!F2");
        assert_eq!(body["data"][0]["values"][0][0], "Contacted");
        assert_eq!(body["data"][1]["range"], "'Leads'!G2");
    }

    #[tokio::test]
    async fn update_row_without_matching_columns_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["Name", "Phone"]]
            })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store
            .update_row(RowRef::new(3), &[(columns::STATUS, "Failed".to_string())])
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingColumns { row: 3, .. }));
    }
}
