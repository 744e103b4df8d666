//! # tabconv
//!
//! Convert tabular files between Excel (`.xlsx`) and CSV, with optional row
//! cleaning, column selection and a chart preview of one numeric column.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Dispatch   file extension must match the direction (.xlsx / .csv)
//!  ├─ 2. Parse      CSV text or first worksheet → Dataset
//!  ├─ 3. Preview    first rows, captured before any change
//!  ├─ 4. Clean      drop rows with missing cells (Excel → CSV), drop duplicates
//!  ├─ 5. Select     keep chosen columns in chosen order
//!  ├─ 6. Chart      optional bar / line / histogram SVG
//!  └─ 7. Serialize  converted.csv or converted.xlsx
//! ```
//!
//! A file whose extension does not match the direction produces no output
//! and no error (`Ok(None)`); set
//! [`ConversionOptionsBuilder::strict_extension`] to get
//! [`ConvertError::ExtensionMismatch`] instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabconv::{convert, ConversionOptions, Direction, UploadedFile};
//!
//! let upload = UploadedFile::new("data.csv", "a,b\n1,2\n1,2\n3,4\n");
//! let options = ConversionOptions::builder()
//!     .direction(Direction::CsvToExcel)
//!     .drop_duplicates(true)
//!     .build()
//!     .unwrap();
//!
//! let output = convert(&upload, &options).unwrap().expect("extension matches");
//! assert_eq!(output.stats.duplicate_rows_removed, 1);
//! assert_eq!(output.artifact.filename, "converted.xlsx");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tabconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! tabconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod dataset;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChartKind, ChartRequest, ConversionOptions, ConversionOptionsBuilder, Direction, FileFormat,
};
pub use convert::{convert, convert_file, convert_to_file, inspect, write_artifact};
pub use dataset::{Cell, Column, ColumnKind, Dataset};
pub use error::ConvertError;
pub use output::{
    ChartPreview, ColumnSummary, ConversionOutput, ConversionStats, DatasetSummary,
    HistogramBin, Notice, NoticeLevel, OutputArtifact,
};
pub use pipeline::input::UploadedFile;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
