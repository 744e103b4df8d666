//! Configuration types for a single conversion run.
//!
//! Every user choice is captured in one immutable [`ConversionOptions`]
//! value built via [`ConversionOptionsBuilder`]. The pipeline never reads
//! global or session state: the caller (CLI, web handler, test) holds the
//! UI state and passes a fresh options value on every run.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of rows shown in the preview table.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Default chart size in pixels.
pub const DEFAULT_CHART_SIZE: (u32, u32) = (640, 480);

/// Options for one conversion run.
///
/// # Example
/// ```rust
/// use tabconv::{ChartKind, ConversionOptions, Direction};
///
/// let options = ConversionOptions::builder()
///     .direction(Direction::CsvToExcel)
///     .drop_duplicates(true)
///     .columns(["name", "price"])
///     .chart(ChartKind::Histogram, Some("price"))
///     .build()
///     .unwrap();
/// assert!(options.drop_duplicates);
/// ```
#[derive(Clone)]
pub struct ConversionOptions {
    /// Which way to convert. Default: [`Direction::ExcelToCsv`].
    pub direction: Direction,

    /// Drop rows that contain any missing cell. Applies to
    /// [`Direction::ExcelToCsv`] only; ignored (with a warning notice) otherwise.
    pub drop_missing: bool,

    /// Drop rows that exactly repeat an earlier row.
    pub drop_duplicates: bool,

    /// Columns to keep, in output order. `None` keeps every column.
    pub columns: Option<Vec<String>>,

    /// Optional chart preview of one numeric column.
    pub chart: Option<ChartRequest>,

    /// Turn an upload/direction extension mismatch into
    /// [`ConvertError::ExtensionMismatch`] instead of a silent no-op. Default: false.
    pub strict_extension: bool,

    /// Rows captured in the preview table. Default: 5.
    pub preview_rows: usize,

    /// Chart width and height in pixels. Default: 640×480.
    pub chart_size: (u32, u32),

    /// Optional stage-event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            drop_missing: false,
            drop_duplicates: false,
            columns: None,
            chart: None,
            strict_extension: false,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            chart_size: DEFAULT_CHART_SIZE,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionOptions")
            .field("direction", &self.direction)
            .field("drop_missing", &self.drop_missing)
            .field("drop_duplicates", &self.drop_duplicates)
            .field("columns", &self.columns)
            .field("chart", &self.chart)
            .field("strict_extension", &self.strict_extension)
            .field("preview_rows", &self.preview_rows)
            .field("chart_size", &self.chart_size)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionOptions {
    /// Create a new builder for `ConversionOptions`.
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn direction(mut self, direction: Direction) -> Self {
        self.options.direction = direction;
        self
    }

    pub fn drop_missing(mut self, v: bool) -> Self {
        self.options.drop_missing = v;
        self
    }

    pub fn drop_duplicates(mut self, v: bool) -> Self {
        self.options.drop_duplicates = v;
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Keep every column (the default).
    pub fn all_columns(mut self) -> Self {
        self.options.columns = None;
        self
    }

    /// Request a chart. `column = None` charts the first numeric column.
    pub fn chart(mut self, kind: ChartKind, column: Option<&str>) -> Self {
        self.options.chart = Some(ChartRequest {
            kind,
            column: column.map(str::to_string),
        });
        self
    }

    pub fn strict_extension(mut self, v: bool) -> Self {
        self.options.strict_extension = v;
        self
    }

    pub fn preview_rows(mut self, n: usize) -> Self {
        self.options.preview_rows = n;
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.options.chart_size = (width, height);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ConversionOptions, ConvertError> {
        let o = &self.options;
        let (w, h) = o.chart_size;
        if !(100..=4000).contains(&w) || !(100..=4000).contains(&h) {
            return Err(ConvertError::InvalidConfig(format!(
                "Chart size must be 100–4000 px per side, got {w}×{h}"
            )));
        }
        if let Some(ref cols) = o.columns {
            if let Some(blank) = cols.iter().position(|c| c.trim().is_empty()) {
                return Err(ConvertError::InvalidConfig(format!(
                    "Column name at position {} is blank",
                    blank + 1
                )));
            }
        }
        if let Some(ChartRequest {
            column: Some(ref c),
            ..
        }) = o.chart
        {
            if c.trim().is_empty() {
                return Err(ConvertError::InvalidConfig(
                    "Chart column name is blank".into(),
                ));
            }
        }
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// A spreadsheet file format handled by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-delimited UTF-8 text.
    Csv,
    /// Office Open XML workbook.
    Xlsx,
}

impl FileFormat {
    /// The filename suffix an upload must carry to be processed.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => ".csv",
            FileFormat::Xlsx => ".xlsx",
        }
    }

    /// MIME type offered with the download.
    pub fn mime_type(self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Xlsx => "application/vnd.ms-excel",
        }
    }

    /// Fixed filename suggested for the download.
    pub fn suggested_filename(self) -> &'static str {
        match self {
            FileFormat::Csv => "converted.csv",
            FileFormat::Xlsx => "converted.xlsx",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => f.write_str("CSV"),
            FileFormat::Xlsx => f.write_str("Excel"),
        }
    }
}

/// Conversion direction, i.e. the format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// "Excel to CSV" (default).
    #[default]
    ExcelToCsv,
    /// "CSV to Excel".
    CsvToExcel,
}

impl Direction {
    pub fn input_format(self) -> FileFormat {
        match self {
            Direction::ExcelToCsv => FileFormat::Xlsx,
            Direction::CsvToExcel => FileFormat::Csv,
        }
    }

    pub fn output_format(self) -> FileFormat {
        match self {
            Direction::ExcelToCsv => FileFormat::Csv,
            Direction::CsvToExcel => FileFormat::Xlsx,
        }
    }

    /// Human label as shown by the format selector.
    pub fn label(self) -> &'static str {
        match self {
            Direction::ExcelToCsv => "Excel to CSV",
            Direction::CsvToExcel => "CSV to Excel",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = ConvertError;

    /// Accepts the selector labels ("Excel to CSV") and kebab-case forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "excel to csv" | "xlsx to csv" => Ok(Direction::ExcelToCsv),
            "csv to excel" | "csv to xlsx" => Ok(Direction::CsvToExcel),
            _ => Err(ConvertError::InvalidConfig(format!(
                "Unknown conversion direction '{s}' (expected 'Excel to CSV' or 'CSV to Excel')"
            ))),
        }
    }
}

/// Preset chart renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// One bar per row value (default, first radio option).
    #[default]
    Bar,
    /// Values joined in row order.
    Line,
    /// Fixed-width bins over the value range.
    Histogram,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar",
            ChartKind::Line => "Line",
            ChartKind::Histogram => "Histogram",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A chart preview request: which numeric column and which chart kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    /// Column to plot; `None` picks the first numeric column.
    pub column: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_selector_defaults() {
        let o = ConversionOptions::default();
        assert_eq!(o.direction, Direction::ExcelToCsv);
        assert!(!o.drop_missing);
        assert!(!o.drop_duplicates);
        assert!(o.columns.is_none());
        assert!(o.chart.is_none());
        assert_eq!(o.preview_rows, 5);
    }

    #[test]
    fn direction_formats() {
        assert_eq!(Direction::ExcelToCsv.input_format(), FileFormat::Xlsx);
        assert_eq!(Direction::ExcelToCsv.output_format(), FileFormat::Csv);
        assert_eq!(Direction::CsvToExcel.input_format(), FileFormat::Csv);
        assert_eq!(Direction::CsvToExcel.output_format(), FileFormat::Xlsx);
    }

    #[test]
    fn direction_parses_labels() {
        assert_eq!("Excel to CSV".parse::<Direction>().unwrap(), Direction::ExcelToCsv);
        assert_eq!("csv-to-excel".parse::<Direction>().unwrap(), Direction::CsvToExcel);
        assert!("pdf to csv".parse::<Direction>().is_err());
    }

    #[test]
    fn download_metadata_is_fixed() {
        assert_eq!(FileFormat::Csv.suggested_filename(), "converted.csv");
        assert_eq!(FileFormat::Csv.mime_type(), "text/csv");
        assert_eq!(FileFormat::Xlsx.suggested_filename(), "converted.xlsx");
        assert_eq!(FileFormat::Xlsx.mime_type(), "application/vnd.ms-excel");
    }

    #[test]
    fn builder_rejects_blank_column() {
        let err = ConversionOptions::builder()
            .columns(["a", "  "])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("position 2"), "got: {err}");
    }

    #[test]
    fn builder_rejects_out_of_range_chart_size() {
        let err = ConversionOptions::builder()
            .chart_size(10, 480)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
        assert!(ConversionOptions::builder().chart_size(640, 10_000).build().is_err());

        let o = ConversionOptions::builder()
            .chart_size(100, 4000)
            .build()
            .unwrap();
        assert_eq!(o.chart_size, (100, 4000));
    }

    #[test]
    fn chart_request_defaults_to_bar() {
        let o = ConversionOptions::builder()
            .chart(ChartKind::default(), None)
            .build()
            .unwrap();
        let req = o.chart.unwrap();
        assert_eq!(req.kind, ChartKind::Bar);
        assert!(req.column.is_none());
    }
}
