//! Parsing: upload bytes → [`Dataset`].
//!
//! Both readers share the same header and missing-value rules so a table
//! looks the same whichever way it arrives:
//!
//! - the first row is the header; blank names become `Unnamed: <i>` and
//!   repeats become `name.1`, `name.2`, …
//! - empty cells and the usual NA spellings (`NA`, `N/A`, `NaN`, `null`, …)
//!   are missing
//! - CSV text is typed per column: a column is integer, float or boolean only
//!   if every present value parses as such, otherwise it keeps its raw text

use crate::config::FileFormat;
use crate::dataset::{Cell, Column, Dataset};
use crate::error::ConvertError;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::debug;

/// Text values read as missing cells.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode an upload with the given format.
pub fn parse(bytes: &[u8], format: FileFormat) -> Result<Dataset, ConvertError> {
    match format {
        FileFormat::Csv => parse_csv(bytes),
        FileFormat::Xlsx => parse_xlsx(bytes),
    }
}

pub fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(&s)
}

// ── CSV ──────────────────────────────────────────────────────────────────

/// Parse comma-delimited UTF-8 text with a header row.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset, ConvertError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ConvertError::parse(FileFormat::Csv, "No columns to parse from file"));
    }
    if let Some(line) = unterminated_quote_line(bytes) {
        return Err(ConvertError::parse(
            FileFormat::Csv,
            format!("EOF inside string starting at line {line}"),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ConvertError::parse(FileFormat::Csv, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let width = headers.len();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for record in reader.records() {
        let record = record.map_err(|e| ConvertError::parse(FileFormat::Csv, e))?;
        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(ConvertError::parse(
                FileFormat::Csv,
                format!(
                    "Expected {width} fields in line {line}, saw {}",
                    record.len()
                ),
            ));
        }
        for (i, column) in raw.iter_mut().enumerate() {
            let value = record.get(i).filter(|v| !is_na_token(v));
            column.push(value.map(str::to_string));
        }
    }

    let columns = normalise_headers(headers)
        .into_iter()
        .zip(raw)
        .map(|(name, values)| Column::new(name, type_column(values)))
        .collect();
    let ds = Dataset::new(columns)?;
    debug!("Parsed CSV: {} rows × {} columns", ds.row_count(), ds.column_count());
    Ok(ds)
}

/// Line on which a quoted field opens without ever closing.
fn unterminated_quote_line(bytes: &[u8]) -> Option<usize> {
    let mut line = 1;
    let mut opened_at = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            match b {
                b'"' if bytes.get(i + 1) == Some(&b'"') => i += 1,
                b'"' => in_quotes = false,
                b'\n' => line += 1,
                _ => {}
            }
        } else {
            match b {
                b',' | b'\r' => field_start = true,
                b'\n' => {
                    line += 1;
                    field_start = true;
                }
                b'"' if field_start => {
                    in_quotes = true;
                    opened_at = line;
                    field_start = false;
                }
                _ => field_start = false,
            }
        }
        i += 1;
    }

    in_quotes.then_some(opened_at)
}

static RE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static RE_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|(?i:inf|infinity))$").unwrap()
});

/// A single CSV value read as a scalar.
fn scalar(raw: &str) -> Cell {
    let s = raw.trim();
    if RE_INT.is_match(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Cell::Int(i);
        }
    }
    if RE_FLOAT.is_match(s) {
        if let Ok(f) = s.parse::<f64>() {
            return Cell::Float(f);
        }
    }
    match s {
        "True" | "TRUE" | "true" => Cell::Bool(true),
        "False" | "FALSE" | "false" => Cell::Bool(false),
        _ => Cell::Text(raw.to_string()),
    }
}

/// Type a CSV column as a whole: numbers and booleans only when every
/// present value agrees, raw text otherwise.
fn type_column(values: Vec<Option<String>>) -> Vec<Cell> {
    let typed: Vec<Cell> = values
        .iter()
        .map(|v| v.as_deref().map_or(Cell::Missing, scalar))
        .collect();

    let present = || typed.iter().filter(|c| !c.is_missing());
    let all_numeric = present().all(|c| matches!(c, Cell::Int(_) | Cell::Float(_)));
    let all_bool = present().all(|c| matches!(c, Cell::Bool(_)));
    if all_numeric || all_bool {
        return typed;
    }

    values
        .into_iter()
        .map(|v| v.map_or(Cell::Missing, Cell::Text))
        .collect()
}

// ── XLSX ─────────────────────────────────────────────────────────────────

/// Parse the first worksheet of an `.xlsx` workbook; its first used row is
/// the header.
pub fn parse_xlsx(bytes: &[u8]) -> Result<Dataset, ConvertError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| ConvertError::parse(FileFormat::Xlsx, e))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConvertError::parse(FileFormat::Xlsx, "workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ConvertError::parse(FileFormat::Xlsx, e))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| {
        ConvertError::parse(
            FileFormat::Xlsx,
            format!("worksheet '{sheet}' is empty; no columns to parse"),
        )
    })?;
    let headers = normalise_headers(
        header_row
            .iter()
            .map(|d| match d {
                Data::String(s) => s.clone(),
                other => cell_from_data(other).to_string(),
            })
            .collect(),
    );
    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    let ds = Dataset::from_rows(headers, body)?;
    debug!(
        "Parsed worksheet '{}': {} rows × {} columns",
        sheet,
        ds.row_count(),
        ds.column_count()
    );
    Ok(ds)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Missing,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if is_na_token(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Cell::Text(ts.to_string()),
            None => float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
        #[allow(unreachable_patterns)]
        other => Cell::Text(format!("{other:?}")),
    }
}

/// Worksheets store every number as a float; integral ones read as integers.
fn float_cell(f: f64) -> Cell {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if f.is_finite() && f.fract() == 0.0 && f.abs() < EXACT {
        Cell::Int(f as i64)
    } else {
        Cell::Float(f)
    }
}

// ── Headers ──────────────────────────────────────────────────────────────

/// Fill blank header names and make every name unique.
pub fn normalise_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut suffixes: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let mut candidate = base.clone();
            while used.contains(&candidate) {
                let n = suffixes.entry(base.clone()).or_insert(0);
                *n += 1;
                candidate = format!("{base}.{n}");
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;

    #[test]
    fn csv_basic_types() {
        let ds = parse_csv(b"id,price,name,flag\n1,2.5,apple,True\n2,3,pear,False\n").unwrap();
        assert_eq!(ds.column_names(), vec!["id", "price", "name", "flag"]);
        assert_eq!(ds.row_count(), 2);
        let kinds: Vec<ColumnKind> = ds.columns().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Text,
                ColumnKind::Boolean
            ]
        );
        assert_eq!(ds.column("price").unwrap().cells()[1], Cell::Float(3.0));
    }

    #[test]
    fn csv_na_tokens_are_missing() {
        let ds = parse_csv(b"a,b\n1,NA\n,x\nnull,y\n").unwrap();
        let a = ds.column("a").unwrap();
        assert_eq!(a.kind(), ColumnKind::Float);
        assert_eq!(a.cells(), &[Cell::Float(1.0), Cell::Missing, Cell::Missing]);
        assert_eq!(ds.column("b").unwrap().cells()[0], Cell::Missing);
    }

    #[test]
    fn csv_mixed_column_keeps_raw_text() {
        let ds = parse_csv(b"code\n007\nA1\n1.50\n").unwrap();
        let c = ds.column("code").unwrap();
        assert_eq!(c.kind(), ColumnKind::Text);
        assert_eq!(c.cells()[0], Cell::Text("007".into()));
        assert_eq!(c.cells()[2], Cell::Text("1.50".into()));
    }

    #[test]
    fn csv_quoted_fields() {
        let ds = parse_csv(b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(ds.row(0)[0], &Cell::Text("Smith, J".into()));
        assert_eq!(ds.row(0)[1], &Cell::Text("said \"hi\"".into()));
    }

    #[test]
    fn csv_unterminated_quote_is_error() {
        let err = parse_csv(b"a,b\n1,\"oops\n2,3\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("EOF inside string"), "got: {msg}");
        assert!(msg.contains("line 2"), "got: {msg}");
    }

    #[test]
    fn csv_quote_inside_unquoted_field_is_literal() {
        let ds = parse_csv(b"h\n5\"\n").unwrap();
        assert_eq!(ds.row(0)[0], &Cell::Text("5\"".into()));
    }

    #[test]
    fn csv_empty_input_is_error() {
        assert!(parse_csv(b"").is_err());
        assert!(parse_csv(b"  \n").is_err());
    }

    #[test]
    fn csv_short_rows_padded_long_rows_rejected() {
        let ds = parse_csv(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(ds.row(0)[2], &Cell::Missing);

        let err = parse_csv(b"a,b\n1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("Expected 2 fields"), "got: {err}");
    }

    #[test]
    fn csv_strips_bom() {
        let ds = parse_csv(b"\xEF\xBB\xBFa,b\n1,2\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn csv_invalid_utf8_is_error() {
        let err = parse_csv(b"a\n\xFF\xFE\n").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: FileFormat::Csv, .. }));
    }

    #[test]
    fn csv_header_only() {
        let ds = parse_csv(b"a,b\n").unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 2);
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn headers_deduplicated_and_filled() {
        let h = normalise_headers(vec![
            "a".into(),
            "a".into(),
            "".into(),
            "a".into(),
            "a.1".into(),
        ]);
        assert_eq!(h, vec!["a", "a.1", "Unnamed: 2", "a.2", "a.1.1"]);
    }

    #[test]
    fn scalar_inference() {
        assert_eq!(scalar(" 42 "), Cell::Int(42));
        assert_eq!(scalar("-1e3"), Cell::Float(-1000.0));
        assert_eq!(scalar(".5"), Cell::Float(0.5));
        assert_eq!(scalar("inf"), Cell::Float(f64::INFINITY));
        assert_eq!(scalar("99999999999999999999"), Cell::Float(1e20));
        assert_eq!(scalar("TRUE"), Cell::Bool(true));
        assert_eq!(scalar("1,000"), Cell::Text("1,000".into()));
    }

    #[test]
    fn float_cells_from_sheets() {
        assert_eq!(float_cell(3.0), Cell::Int(3));
        assert_eq!(float_cell(3.5), Cell::Float(3.5));
    }

    #[test]
    fn xlsx_garbage_is_parse_error() {
        let err = parse_xlsx(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: FileFormat::Xlsx, .. }));
    }

    #[test]
    fn xlsx_round_trip_from_writer() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, "qty").unwrap();
        sheet.write_string(1, 0, "bolt").unwrap();
        sheet.write_number(1, 1, 4.0).unwrap();
        sheet.write_string(2, 0, "nut").unwrap();
        sheet.write_number(2, 1, 2.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let ds = parse_xlsx(&bytes).unwrap();
        assert_eq!(ds.column_names(), vec!["name", "qty"]);
        assert_eq!(ds.row_count(), 2);
        let qty = ds.column("qty").unwrap();
        assert_eq!(qty.kind(), ColumnKind::Float);
        assert_eq!(qty.cells(), &[Cell::Float(4.0), Cell::Float(2.5)]);
    }
}
