use backon::{ExponentialBuilder, Retryable};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::DataSource;
use crate::fetch_error::FetchError;
use crate::metrics::MetricTable;
use crate::normalizer::CellValue;
use crate::operational::OperationalSnapshot;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Upper bound for one request attempt
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How the Sheets API renders cell values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRender {
    /// Display strings as seen in the sheet ("R$ 1.234,56")
    Formatted,
    /// Raw numbers (0.054 for 5,40%)
    Unformatted,
}

impl ValueRender {
    pub fn as_param(self) -> &'static str {
        match self {
            ValueRender::Formatted => "FORMATTED_VALUE",
            ValueRender::Unformatted => "UNFORMATTED_VALUE",
        }
    }
}

/// Header row plus raw data rows of one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    /// Split the first row off as the header
    pub fn from_cells(mut cells: Vec<Vec<CellValue>>) -> Result<Self, FetchError> {
        if cells.is_empty() {
            return Err(FetchError::MissingHeader);
        }
        let header = cells
            .remove(0)
            .iter()
            .map(|c| c.as_text().unwrap_or_default())
            .collect::<Vec<_>>();
        if header.iter().all(String::is_empty) {
            return Err(FetchError::MissingHeader);
        }
        Ok(Self {
            header,
            rows: cells,
        })
    }

    pub fn to_metric_table(&self) -> MetricTable {
        MetricTable::from_grid(&self.header, &self.rows)
    }

    pub fn to_operational_snapshot(&self) -> OperationalSnapshot {
        OperationalSnapshot::from_grid(&self.header, &self.rows)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Reads one sheet through the Google Sheets API v4 values endpoint
#[derive(Clone)]
pub struct SheetsFetcher {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet: String,
    render: ValueRender,
    api_key: Option<String>,
    access_token: Option<String>,
    max_retries: usize,
    min_retry_delay: Duration,
    timeout: Duration,
}

impl SheetsFetcher {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet: impl Into<String>,
        render: ValueRender,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet: sheet.into(),
            render,
            api_key: None,
            access_token: None,
            max_retries: 3,
            min_retry_delay: Duration::from_millis(500),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, min_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.min_retry_delay = min_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    fn values_url(&self) -> Result<Url, FetchError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.sheet.as_str(),
            ]);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("valueRenderOption", self.render.as_param())
                .append_pair("majorDimension", "ROWS");
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }

        Ok(url)
    }

    /// Fetch the sheet, retrying transient failures with exponential backoff
    #[instrument(skip(self), fields(sheet = %self.sheet))]
    pub async fn fetch_grid(&self) -> Result<SheetGrid, FetchError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_retry_delay)
            .with_max_times(self.max_retries);

        (|| self.fetch_grid_once())
            .retry(backoff)
            .when(FetchError::is_transient)
            .notify(|e: &FetchError, delay: Duration| {
                warn!("Sheet fetch failed ({}), retrying in {:?}", e, delay);
            })
            .await
    }

    async fn fetch_grid_once(&self) -> Result<SheetGrid, FetchError> {
        let url = self.values_url()?;
        debug!("Sending request to Sheets API: {}", url.path());

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        debug!("Retrieved sheet payload, size: {} bytes", text.len());
        Self::parse_payload(&text)
    }

    fn parse_payload(text: &str) -> Result<SheetGrid, FetchError> {
        let range: ValueRange =
            serde_json::from_str(text).map_err(|e| FetchError::ParseError(e.to_string()))?;

        let cells = range
            .values
            .iter()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();

        SheetGrid::from_cells(cells)
    }
}

impl DataSource<MetricTable> for SheetsFetcher {
    fn name(&self) -> String {
        format!("sheets:{}", self.sheet)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<MetricTable, FetchError>> {
        async move { Ok(self.fetch_grid().await?.to_metric_table()) }.boxed()
    }
}

impl DataSource<OperationalSnapshot> for SheetsFetcher {
    fn name(&self) -> String {
        format!("sheets:{}", self.sheet)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<OperationalSnapshot, FetchError>> {
        async move { Ok(self.fetch_grid().await?.to_operational_snapshot()) }.boxed()
    }
}
