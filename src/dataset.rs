//! In-memory table: named, typed, equal-length columns.
//!
//! A [`Dataset`] is built once by the parse stage and then narrowed by the
//! cleaning and selection stages. Fields are private so the two invariants
//! (equal column lengths, unique column names) are checked at construction
//! and cannot be broken afterwards.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric value, if the cell holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => f.write_str(&format_float(*v)),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip float text, always with a fractional part or exponent
/// (`1.0`, `2.5`, `1e21`).
pub fn format_float(v: f64) -> String {
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }
    // Debug keeps ".0" on integral values and switches to exponent form for
    // very large or small magnitudes.
    format!("{v:?}")
}

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
        })
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Build a column and infer its kind.
    ///
    /// Integral columns with gaps, and columns mixing integers and floats,
    /// become [`ColumnKind::Float`] and their `Int` cells are widened. A
    /// column whose cells are all missing is `Float`; a column with no rows
    /// at all is `Text`.
    pub fn new(name: impl Into<String>, mut cells: Vec<Cell>) -> Self {
        let kind = infer_kind(&cells);
        if kind == ColumnKind::Float {
            for cell in cells.iter_mut() {
                if let Cell::Int(i) = *cell {
                    *cell = Cell::Float(i as f64);
                }
            }
        }
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Present numeric values paired with their row position.
    pub fn numeric_values(&self) -> Vec<(usize, f64)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_f64().map(|v| (i, v)))
            .collect()
    }
}

fn infer_kind(cells: &[Cell]) -> ColumnKind {
    let mut has_missing = false;
    let (mut ints, mut floats, mut bools, mut other) = (0usize, 0usize, 0usize, 0usize);
    for cell in cells {
        match cell {
            Cell::Missing => has_missing = true,
            Cell::Int(_) => ints += 1,
            Cell::Float(_) => floats += 1,
            Cell::Bool(_) => bools += 1,
            Cell::Text(_) => other += 1,
        }
    }

    if cells.is_empty() {
        return ColumnKind::Text;
    }
    if ints + floats + bools + other == 0 {
        return ColumnKind::Float;
    }
    if other == 0 && bools == 0 {
        if floats == 0 && !has_missing {
            return ColumnKind::Integer;
        }
        return ColumnKind::Float;
    }
    if other == 0 && ints + floats == 0 && !has_missing {
        return ColumnKind::Boolean;
    }
    ColumnKind::Text
}

/// Ordered collection of equal-length, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Assemble a dataset, checking both invariants.
    pub fn new(columns: Vec<Column>) -> Result<Self, ConvertError> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(ConvertError::Internal(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.name.as_str()) {
                return Err(ConvertError::DuplicateColumn {
                    name: c.name.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Build from a header and row-major cells. Short rows are padded with
    /// [`Cell::Missing`]; long rows are an error.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, ConvertError> {
        let width = headers.len();
        let mut by_column: Vec<Vec<Cell>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ConvertError::Internal(format!(
                    "row {} has {} cells but the header has {}",
                    r + 1,
                    row.len(),
                    width
                )));
            }
            let mut cells = row.into_iter();
            for column in by_column.iter_mut() {
                column.push(cells.next().unwrap_or(Cell::Missing));
            }
        }
        Self::new(
            headers
                .into_iter()
                .zip(by_column)
                .map(|(name, cells)| Column::new(name, cells))
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Integer and float columns, in table order.
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.kind.is_numeric()).collect()
    }

    /// Cells of row `index`, left to right.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[index]).collect()
    }

    /// Row-major iteration.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count()).map(move |i| self.row(i))
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        let n = n.min(self.row_count());
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    kind: c.kind,
                    cells: c.cells[..n].to_vec(),
                })
                .collect(),
        }
    }

    /// Keep rows whose flag is `true`. Column kinds are left as inferred at
    /// parse time.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count());
        for column in self.columns.iter_mut() {
            let mut flags = keep.iter();
            column.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Reorder/narrow columns to the given indices. Indices must be unique
    /// and in range.
    pub(crate) fn take_columns(mut self, indices: &[usize]) -> Dataset {
        let mut slots: Vec<Option<Column>> = self.columns.drain(..).map(Some).collect();
        Dataset {
            columns: indices.iter().filter_map(|&i| slots[i].take()).collect(),
        }
    }
}

const MAX_DISPLAY_WIDTH: usize = 24;

/// Plain-text table with a leading row index, used for previews.
impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.row_count();
        let index_width = rows.saturating_sub(1).to_string().len();

        let rendered: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| {
                c.cells
                    .iter()
                    .map(|cell| match cell {
                        Cell::Missing => "None".to_string(),
                        other => truncate(&other.to_string()),
                    })
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&rendered)
            .map(|(c, cells)| {
                cells
                    .iter()
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(truncate(&c.name).chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (c, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", truncate(&c.name))?;
        }
        writeln!(f)?;
        for r in 0..rows {
            write!(f, "{r:>index_width$}")?;
            for (cells, w) in rendered.iter().zip(&widths) {
                write!(f, "  {:>w$}", cells[r])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > MAX_DISPLAY_WIDTH {
        let head: String = s.chars().take(MAX_DISPLAY_WIDTH - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}
