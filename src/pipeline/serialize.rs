//! Serialization: final [`Dataset`] → downloadable bytes.
//!
//! Neither format carries a row-index column; both start with the header row.

use crate::config::FileFormat;
use crate::dataset::{format_float, Cell, Dataset};
use crate::error::ConvertError;
use crate::output::OutputArtifact;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::debug;

/// Encode the table in `format` and wrap it with download metadata.
pub fn serialize(ds: &Dataset, format: FileFormat) -> Result<OutputArtifact, ConvertError> {
    let bytes = match format {
        FileFormat::Csv => to_csv(ds)?.into_bytes(),
        FileFormat::Xlsx => to_xlsx(ds)?,
    };
    debug!("Serialized {} → {} bytes", format, bytes.len());
    Ok(OutputArtifact::new(format, bytes))
}

/// Comma-delimited UTF-8 text with `\n` line endings, quoting only where needed.
pub fn to_csv(ds: &Dataset) -> Result<String, ConvertError> {
    let err = |e: csv::Error| ConvertError::serialize(FileFormat::Csv, e);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(ds.column_names()).map_err(err)?;
    for row in ds.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::serialize(FileFormat::Csv, e.error()))?;
    String::from_utf8(bytes).map_err(|e| ConvertError::serialize(FileFormat::Csv, e))
}

/// Single-sheet workbook with a bold header row.
pub fn to_xlsx(ds: &Dataset) -> Result<Vec<u8>, ConvertError> {
    let err = |e: rust_xlsxwriter::XlsxError| ConvertError::serialize(FileFormat::Xlsx, e);
    let mut workbook = Workbook::new();
    let header = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);

    {
        let worksheet = workbook.add_worksheet();
        for (c, column) in ds.columns().iter().enumerate() {
            let col = u16::try_from(c).map_err(|_| {
                ConvertError::serialize(FileFormat::Xlsx, format!("too many columns ({})", ds.column_count()))
            })?;
            worksheet
                .write_string_with_format(0, col, column.name(), &header)
                .map_err(err)?;

            for (r, cell) in column.cells().iter().enumerate() {
                let row = u32::try_from(r + 1).map_err(|_| {
                    ConvertError::serialize(FileFormat::Xlsx, format!("too many rows ({})", ds.row_count()))
                })?;
                match cell {
                    Cell::Missing => continue,
                    Cell::Int(i) => worksheet.write_number(row, col, *i as f64),
                    Cell::Float(f) if f.is_finite() => worksheet.write_number(row, col, *f),
                    Cell::Float(f) => worksheet.write_string(row, col, format_float(*f)),
                    Cell::Bool(b) => worksheet.write_boolean(row, col, *b),
                    Cell::Text(s) => worksheet.write_string(row, col, s),
                }
                .map_err(err)?;
            }
        }
    }

    workbook.save_to_buffer().map_err(err)
}
