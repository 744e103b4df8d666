//! Pipeline stages for spreadsheet conversion.
//!
//! Each submodule implements exactly one transformation step and is a plain
//! synchronous function over owned or borrowed values, so every stage can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ clean ──▶ select ──▶ chart ──▶ serialize
//! (upload)  (Dataset) (rows)    (columns)  (SVG)     (CSV / XLSX)
//! ```
//!
//! 1. [`input`]    : hold the upload and check its extension against the direction
//! 2. [`parse`]    : decode CSV text or the first XLSX worksheet into a [`crate::Dataset`]
//! 3. [`clean`]    : drop rows with missing cells; drop repeated rows
//! 4. [`select`]   : project onto the chosen columns
//! 5. [`chart`]    : optional bar / line / histogram preview of one numeric column
//! 6. [`serialize`]: encode the final table for download

pub mod chart;
pub mod clean;
pub mod input;
pub mod parse;
pub mod select;
pub mod serialize;
