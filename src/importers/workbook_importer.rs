use calamine::{open_workbook_auto, Data, Range, Reader};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::DataSource;
use crate::fetch_error::FetchError;
use crate::fetcher::SheetGrid;
use crate::metrics::MetricTable;
use crate::normalizer::CellValue;
use crate::operational::OperationalSnapshot;

#[derive(Error, Debug)]
pub enum WorkbookImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet {0} has no header row")]
    EmptySheet(String),
}

/// Reads one sheet from a local export of the dashboard spreadsheet
#[derive(Debug, Clone)]
pub struct WorkbookImporter {
    workbook_path: PathBuf,
    sheet: String,
}

impl WorkbookImporter {
    pub fn new(workbook_path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Read the sheet into a header + rows grid.
    ///
    /// This is synchronous, async callers should use spawn_blocking.
    pub fn read_grid(&self) -> Result<SheetGrid, WorkbookImportError> {
        info!(
            "Reading sheet '{}' from {}",
            self.sheet,
            self.workbook_path.display()
        );

        let mut workbook = open_workbook_auto(&self.workbook_path)
            .map_err(|e| WorkbookImportError::WorkbookOpen(e.to_string()))?;

        let range = workbook
            .worksheet_range(&self.sheet)
            .map_err(|_| WorkbookImportError::SheetNotFound(self.sheet.clone()))?;

        let grid = range_to_grid(&range)
            .ok_or_else(|| WorkbookImportError::EmptySheet(self.sheet.clone()))?;

        debug!(
            "Sheet '{}' has {} columns and {} data rows",
            self.sheet,
            grid.header.len(),
            grid.rows.len()
        );
        Ok(grid)
    }

    fn read_grid_blocking(&self) -> BoxFuture<'static, Result<SheetGrid, FetchError>> {
        let importer = self.clone();
        async move {
            let grid = tokio::task::spawn_blocking(move || importer.read_grid())
                .await
                .map_err(|e| FetchError::Task(e.to_string()))??;
            Ok(grid)
        }
        .boxed()
    }
}

/// Convert one calamine cell; error cells keep their `#` text
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => {
            let text = e.to_string();
            if text.starts_with('#') {
                CellValue::Text(text)
            } else {
                CellValue::Text(format!("#{text}"))
            }
        }
        Data::Empty => CellValue::Empty,
    }
}

/// First row becomes the header; `None` when the range has no usable header
pub fn range_to_grid(range: &Range<Data>) -> Option<SheetGrid> {
    let cells: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    SheetGrid::from_cells(cells).ok()
}

impl DataSource<MetricTable> for WorkbookImporter {
    fn name(&self) -> String {
        format!("workbook:{}:{}", self.workbook_path.display(), self.sheet)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<MetricTable, FetchError>> {
        let grid = self.read_grid_blocking();
        async move { Ok(grid.await?.to_metric_table()) }.boxed()
    }
}

impl DataSource<OperationalSnapshot> for WorkbookImporter {
    fn name(&self) -> String {
        format!("workbook:{}:{}", self.workbook_path.display(), self.sheet)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<OperationalSnapshot, FetchError>> {
        let grid = self.read_grid_blocking();
        async move { Ok(grid.await?.to_operational_snapshot()) }.boxed()
    }
}
