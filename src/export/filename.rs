//! Download file naming.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("export filename is empty")]
    Empty,
    #[error("export filename contains {0:?}")]
    ForbiddenChar(char),
}

/// Base name of an export, e.g. `orders`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFileName(String);

impl ExportFileName {
    pub fn new(base: &str) -> Result<Self, FileNameError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(FileNameError::Empty);
        }
        // The name is echoed into a Content-Disposition header.
        if let Some(c) = base.chars().find(|c| matches!(c, '/' | '\\' | '"') || c.is_control()) {
            return Err(FileNameError::ForbiddenChar(c));
        }
        Ok(Self(base.to_string()))
    }

    pub fn base(&self) -> &str {
        &self.0
    }

    /// `{base}_{YYYY-MM-DD}.csv`
    pub fn for_date(&self, date: NaiveDate) -> String {
        format!("{}_{}.csv", self.0, date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for ExportFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
