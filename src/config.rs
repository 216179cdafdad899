use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::month::{MonthVocabulary, VocabularyError};
use crate::utils::extract_spreadsheet_id;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(#[from] env::VarError),
    #[error("Invalid SPREADSHEET value: {0}")]
    InvalidSpreadsheet(&'static str),
    #[error("Invalid MONTH_NAMES: {0}")]
    InvalidMonthNames(#[from] VocabularyError),
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub spreadsheet_id: String,
    pub sheets_base_url: String,
    pub sheets_api_key: Option<String>,
    pub sheets_access_token: Option<String>,
    /// Local .xlsx/.ods export; when set the Sheets API is not used
    pub workbook_path: Option<PathBuf>,
    pub dashboard_sheet: String,
    pub operational_sheet: String,
    pub cache_ttl_seconds: u64,
    pub fetch_max_retries: usize,
    pub fetch_timeout_seconds: u64,
    pub month_names: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let workbook_path = optional("WORKBOOK_PATH").map(PathBuf::from);

        // A spreadsheet id is only required when reading from the Sheets API
        let spreadsheet_id = match env::var("SPREADSHEET") {
            Ok(value) => extract_spreadsheet_id(&value).map_err(ConfigError::InvalidSpreadsheet)?,
            Err(e) if workbook_path.is_none() => return Err(e.into()),
            Err(_) => String::new(),
        };

        let month_names = MonthVocabulary::from_optional_csv(optional("MONTH_NAMES").as_deref())?
            .names()
            .to_vec();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            spreadsheet_id,
            sheets_base_url: env::var("SHEETS_BASE_URL")
                .unwrap_or_else(|_| crate::fetcher::DEFAULT_SHEETS_BASE_URL.to_string()),
            sheets_api_key: optional("SHEETS_API_KEY"),
            sheets_access_token: optional("SHEETS_ACCESS_TOKEN"),
            workbook_path,
            dashboard_sheet: env::var("DASHBOARD_SHEET")
                .unwrap_or_else(|_| "DADOS STREAMLIT".to_string()),
            operational_sheet: env::var("OPERATIONAL_SHEET")
                .unwrap_or_else(|_| "DADOS OPERACIONAL".to_string()),
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),
            fetch_max_retries: env::var("FETCH_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            fetch_timeout_seconds: env::var("FETCH_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(30),
            month_names,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn vocabulary(&self) -> Result<MonthVocabulary, VocabularyError> {
        MonthVocabulary::new(&self.month_names)
    }
}

// Credentials never reach the logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheets_base_url", &self.sheets_base_url)
            .field("sheets_api_key", &redact(&self.sheets_api_key))
            .field("sheets_access_token", &redact(&self.sheets_access_token))
            .field("workbook_path", &self.workbook_path)
            .field("dashboard_sheet", &self.dashboard_sheet)
            .field("operational_sheet", &self.operational_sheet)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_timeout_seconds", &self.fetch_timeout_seconds)
            .field("month_names", &self.month_names)
            .finish()
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
