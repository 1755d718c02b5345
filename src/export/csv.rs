//! CSV document assembly.

use super::format::FormatterRegistry;
use super::ExportableRecord;

/// Header plus body rows, every row exactly `columns.len()` cells wide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDocument {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvDocument {
    /// Columns come from the first record only; keys starting with `_` are skipped.
    pub(crate) fn build(first: &ExportableRecord, records: &[ExportableRecord], formatters: &FormatterRegistry) -> Self {
        let columns: Vec<String> = first.keys().filter(|k| !k.starts_with('_')).cloned().collect();
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| formatters.format(c, record.get(c))).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Header and body rows joined by `\n`, every cell quoted.
    pub fn render(&self) -> String {
        std::iter::once(&self.columns)
            .chain(self.rows.iter())
            .map(|row| render_row(row))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_row(cells: &[String]) -> String {
    cells.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",")
}

/// Wraps a cell in double quotes, doubling any embedded quote.
pub fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
