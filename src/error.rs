//! Error types for the tabconv library.
//!
//! A run either produces an artifact, silently produces nothing (the upload's
//! extension does not match the chosen direction), or fails with exactly one
//! [`ConvertError`]. There is no partial output: every stage returns
//! `Result<_, ConvertError>` and the first failure aborts the run.
//!
//! Non-fatal conditions (nothing to deduplicate, a cleaning flag that does not
//! apply to the chosen direction, a chart request on a table without numeric
//! columns) are reported as [`crate::output::Notice`] values instead.

use crate::config::FileFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tabconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}' (check the path exists and is readable)")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}' (try: chmod +r {path:?})")]
    PermissionDenied { path: PathBuf },

    /// Upload extension does not match the direction. Only raised when
    /// `strict_extension` is enabled; otherwise the run yields no output.
    #[error("'{filename}' is not a {expected} file (expected a '{extension}' extension)")]
    ExtensionMismatch {
        filename: String,
        expected: FileFormat,
        extension: &'static str,
    },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The upload could not be decoded as the expected format.
    #[error("Could not read {format} data: {detail}")]
    Parse { format: FileFormat, detail: String },

    // ── Processing errors ─────────────────────────────────────────────────
    /// Column selection left nothing to write.
    #[error("No columns selected; choose at least one column to keep")]
    NoColumnsSelected,

    /// A selected or charted column does not exist in the table.
    #[error("Column '{name}' not found (available: {available})")]
    UnknownColumn { name: String, available: String },

    /// The same column was selected more than once.
    #[error("Column '{name}' selected more than once")]
    DuplicateColumn { name: String },

    /// Chart target is not an integer or float column.
    #[error("Column '{name}' is not numeric ({kind}); charts need a numeric column")]
    NonNumericColumn { name: String, kind: String },

    /// plotters failed while drawing the chart.
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// Encoding the cleaned table failed.
    #[error("Could not write {format} output: {detail}")]
    Serialize { format: FileFormat, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The single inline message shown to the user for a failed run.
    pub fn user_message(&self) -> String {
        format!("⚠️ Error: {self}")
    }

    pub(crate) fn parse(format: FileFormat, detail: impl ToString) -> Self {
        ConvertError::Parse {
            format,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn serialize(format: FileFormat, detail: impl ToString) -> Self {
        ConvertError::Serialize {
            format,
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_has_warning_prefix() {
        let e = ConvertError::NoColumnsSelected;
        let msg = e.user_message();
        assert!(msg.starts_with("⚠️ Error: "), "got: {msg}");
        assert!(msg.contains("No columns selected"));
    }

    #[test]
    fn parse_error_names_format() {
        let e = ConvertError::parse(FileFormat::Csv, "EOF inside string starting at line 2");
        let msg = e.to_string();
        assert!(msg.contains("CSV"), "got: {msg}");
        assert!(msg.contains("line 2"), "got: {msg}");
    }

    #[test]
    fn unknown_column_lists_available() {
        let e = ConvertError::UnknownColumn {
            name: "price".into(),
            available: "a, b".into(),
        };
        assert!(e.to_string().contains("price"));
        assert!(e.to_string().contains("a, b"));
    }

    #[test]
    fn extension_mismatch_display() {
        let e = ConvertError::ExtensionMismatch {
            filename: "data.txt".into(),
            expected: FileFormat::Xlsx,
            extension: ".xlsx",
        };
        let msg = e.to_string();
        assert!(msg.contains("data.txt"));
        assert!(msg.contains(".xlsx"));
    }
}
