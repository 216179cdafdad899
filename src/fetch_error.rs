use crate::importers::WorkbookImportError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Sheets API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse sheet data: {0}")]
    ParseError(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Sheet has no header row")]
    MissingHeader,
    #[error("Workbook import failed: {0}")]
    Workbook(#[from] WorkbookImportError),
    #[error("Background task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Connection problems, timeouts, rate limiting and 5xx are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(e) => e.is_timeout() || e.is_connect(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server_error = FetchError::Status {
            status: 503,
            body: String::new(),
        };
        let rate_limited = FetchError::Status {
            status: 429,
            body: String::new(),
        };
        let forbidden = FetchError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(server_error.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!forbidden.is_transient());
        assert!(!FetchError::MissingHeader.is_transient());
    }
}
