//! Local spreadsheet exports (.xlsx / .ods) as an alternative to the Sheets API

pub mod workbook_importer;

// Re-export commonly used items
pub use workbook_importer::{WorkbookImportError, WorkbookImporter};
