//! Result types produced by a successful conversion run.

use crate::config::{ChartKind, Direction, FileFormat};
use crate::dataset::{ColumnKind, Dataset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized bytes ready to hand to a download mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: FileFormat,
    /// `text/csv` or `application/vnd.ms-excel`.
    pub mime_type: String,
    /// `converted.csv` or `converted.xlsx`.
    pub filename: String,
}

impl OutputArtifact {
    pub(crate) fn new(format: FileFormat, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format,
            mime_type: format.mime_type().to_string(),
            filename: format.suggested_filename().to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// A non-fatal message raised during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.level {
            NoticeLevel::Info => "✅",
            NoticeLevel::Success => "🎉",
            NoticeLevel::Warning => "⚠️",
        };
        write!(f, "{icon} {}", self.message)
    }
}

/// One histogram bin: `[start, end)`, the last bin closed on the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// A rendered chart preview. Does not affect the converted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPreview {
    pub kind: ChartKind,
    pub column: String,
    /// Number of present values plotted.
    pub points: usize,
    /// Bin counts for [`ChartKind::Histogram`]; empty otherwise.
    pub bins: Vec<HistogramBin>,
    /// Standalone SVG document.
    #[serde(skip)]
    pub svg: String,
}

/// Row and timing counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub input_rows: usize,
    pub input_columns: usize,
    pub missing_rows_removed: usize,
    pub duplicate_rows_removed: usize,
    pub output_rows: usize,
    pub output_columns: usize,
    pub output_bytes: usize,
    pub duration_ms: u64,
}

/// Everything a successful run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub direction: Direction,
    /// First rows of the table as parsed, before any cleaning.
    pub preview: Dataset,
    /// Table after cleaning and column selection; what the artifact encodes.
    #[serde(skip)]
    pub dataset: Dataset,
    pub chart: Option<ChartPreview>,
    pub notices: Vec<Notice>,
    pub artifact: OutputArtifact,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Banner shown once an artifact exists.
    pub fn success_message(&self) -> String {
        format!(
            "✅ {} ready: {} rows × {} columns ({} bytes)",
            self.artifact.filename,
            self.stats.output_rows,
            self.stats.output_columns,
            self.stats.output_bytes
        )
    }
}

/// Name and inferred kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Parse-only description of an upload, returned by [`crate::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub filename: String,
    pub size_bytes: usize,
    pub format: FileFormat,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub preview: Dataset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_metadata_follows_format() {
        let a = OutputArtifact::new(FileFormat::Csv, b"a\n1\n".to_vec());
        assert_eq!(a.filename, "converted.csv");
        assert_eq!(a.mime_type, "text/csv");
        assert_eq!(a.len(), 4);

        let x = OutputArtifact::new(FileFormat::Xlsx, Vec::new());
        assert_eq!(x.filename, "converted.xlsx");
        assert!(x.is_empty());
    }

    #[test]
    fn notice_display_has_icon() {
        assert_eq!(
            Notice::success("1 duplicate rows removed successfully!").to_string(),
            "🎉 1 duplicate rows removed successfully!"
        );
        assert!(Notice::info("No duplicate rows found!").to_string().starts_with('✅'));
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = ConversionStats {
            input_rows: 3,
            duplicate_rows_removed: 1,
            output_rows: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"duplicate_rows_removed\":1"), "got: {json}");
    }
}
