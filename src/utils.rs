//! Shared utility functions for the dashboard service

use regex::Regex;
use std::sync::LazyLock;

/// Compiled once; the id is the path segment after `/spreadsheets/d/`
static SPREADSHEET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("spreadsheet URL pattern is valid")
});

/// Extract the spreadsheet id from a Google Sheets share URL or a bare id
///
/// Share links look like `https://docs.google.com/spreadsheets/d/<id>/edit#gid=0`.
/// A value without `/spreadsheets/d/` is accepted as a bare id when it only
/// contains URL-safe id characters.
///
/// # Examples
///
/// ```
/// use mrr_dashboard_service::utils::extract_spreadsheet_id;
///
/// assert_eq!(
///     extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit#gid=0").unwrap(),
///     "1AbC-dEf_123"
/// );
/// assert_eq!(extract_spreadsheet_id("1AbC-dEf_123").unwrap(), "1AbC-dEf_123");
/// assert!(extract_spreadsheet_id("https://example.com/nothing").is_err());
/// ```
pub fn extract_spreadsheet_id(value: &str) -> Result<String, &'static str> {
    let value = value.trim();

    if let Some(caps) = SPREADSHEET_URL.captures(value) {
        return Ok(caps[1].to_string());
    }

    let is_bare_id = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if is_bare_id {
        return Ok(value.to_string());
    }

    Err("No spreadsheet id found")
}
