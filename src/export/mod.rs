//! Tabular CSV export.
//!
//! Turns a list of JSON records (orders, products, customers, reviews...)
//! into a `text/csv` download:
//!
//! - the first record's keys, minus `_`-prefixed ones, fix the columns
//! - every cell is double-quoted, embedded quotes doubled
//! - the file is named `{base}_{YYYY-MM-DD}.csv`
//!
//! An empty record list is the only failure; a cell that cannot be
//! formatted is exported empty.

pub mod csv;
pub mod filename;
pub mod format;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

pub use self::csv::CsvDocument;
pub use filename::{ExportFileName, FileNameError};
pub use format::{CellFormatter, FormatError, FormatterRegistry};

/// One row of arbitrary field data. Field order is insertion order.
pub type ExportableRecord = serde_json::Map<String, serde_json::Value>;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("no data to export")]
    NoData,
    #[error(transparent)]
    InvalidFileName(#[from] FileNameError),
}

/// A finished export ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TabularExporter {
    formatters: FormatterRegistry,
}

impl TabularExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatters(formatters: FormatterRegistry) -> Self {
        Self { formatters }
    }

    pub fn document(&self, records: &[ExportableRecord]) -> Result<CsvDocument, ExportError> {
        let first = records.first().ok_or(ExportError::NoData)?;
        Ok(CsvDocument::build(first, records, &self.formatters))
    }

    pub fn export(&self, records: &[ExportableRecord], base_filename: &str, date: NaiveDate) -> Result<CsvExport, ExportError> {
        let document = self.document(records)?;
        let name = ExportFileName::new(base_filename)?;
        let export = CsvExport {
            filename: name.for_date(date),
            content_type: CSV_CONTENT_TYPE,
            body: document.render(),
            rows: document.rows().len(),
        };
        tracing::debug!(filename = %export.filename, rows = export.rows, columns = document.columns().len(), "csv export built");
        Ok(export)
    }

    /// Exports with today's UTC date in the filename.
    pub fn export_today(&self, records: &[ExportableRecord], base_filename: &str) -> Result<CsvExport, ExportError> {
        self.export(records, base_filename, Utc::now().date_naive())
    }
}
