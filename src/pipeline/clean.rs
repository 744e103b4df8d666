//! Row cleaning: drop rows with missing cells, drop repeated rows.
//!
//! Both passes keep the surviving rows in their original order and return
//! how many rows they removed, so the caller can report it.

use crate::dataset::{Cell, Dataset};
use std::collections::HashSet;
use tracing::debug;

/// Drop every row that has a missing cell in any column. Returns the number
/// of rows removed.
pub fn drop_missing(ds: &mut Dataset) -> usize {
    let before = ds.row_count();
    let keep: Vec<bool> = ds
        .rows()
        .map(|row| !row.iter().any(|c| c.is_missing()))
        .collect();
    ds.retain_rows(&keep);
    let removed = before - ds.row_count();
    debug!("drop_missing: {} → {} rows", before, ds.row_count());
    removed
}

/// Hashable stand-in for a cell. Floats compare by value with `-0.0 == 0.0`.
#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(&'a str),
}

impl<'a> From<&'a Cell> for CellKey<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Missing => CellKey::Missing,
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) if *f == 0.0 => CellKey::Float(0.0f64.to_bits()),
            Cell::Float(f) => CellKey::Float(f.to_bits()),
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Text(s) => CellKey::Text(s),
        }
    }
}

/// Rows that exactly repeat an earlier row, compared across all columns.
pub fn duplicated(ds: &Dataset) -> Vec<bool> {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(ds.row_count());
    ds.rows()
        .map(|row| !seen.insert(row.into_iter().map(CellKey::from).collect()))
        .collect()
}

/// Keep the first occurrence of each group of identical rows. Returns the
/// number of rows removed.
pub fn drop_duplicates(ds: &mut Dataset) -> usize {
    let before = ds.row_count();
    let keep: Vec<bool> = duplicated(ds).into_iter().map(|dup| !dup).collect();
    ds.retain_rows(&keep);
    let removed = before - ds.row_count();
    debug!("drop_duplicates: {} → {} rows", before, ds.row_count());
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<Cell>>) -> Dataset {
        Dataset::from_rows(vec!["a".into(), "b".into()], rows).unwrap()
    }

    fn t(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn drop_missing_removes_rows_with_gaps() {
        let mut ds = table(vec![
            vec![t("x"), t("1")],
            vec![t("y"), Cell::Missing],
            vec![Cell::Missing, t("3")],
            vec![t("z"), t("4")],
        ]);
        assert_eq!(drop_missing(&mut ds), 2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row(1)[0], &t("z"));
    }

    #[test]
    fn drop_missing_is_idempotent() {
        let mut ds = table(vec![
            vec![t("x"), Cell::Missing],
            vec![t("y"), t("2")],
        ]);
        drop_missing(&mut ds);
        let once = ds.clone();
        assert_eq!(drop_missing(&mut ds), 0);
        assert_eq!(ds, once);
    }

    #[test]
    fn drop_duplicates_keeps_first_occurrence_order() {
        let mut ds = table(vec![
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Int(3), Cell::Int(4)],
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Int(5), Cell::Int(6)],
            vec![Cell::Int(3), Cell::Int(4)],
        ]);
        assert_eq!(drop_duplicates(&mut ds), 2);
        let firsts: Vec<&Cell> = ds.rows().map(|r| r[0]).collect();
        assert_eq!(firsts, vec![&Cell::Int(1), &Cell::Int(3), &Cell::Int(5)]);
    }

    #[test]
    fn drop_duplicates_is_idempotent() {
        let mut ds = table(vec![
            vec![t("a"), t("b")],
            vec![t("a"), t("b")],
        ]);
        drop_duplicates(&mut ds);
        let once = ds.clone();
        assert_eq!(drop_duplicates(&mut ds), 0);
        assert_eq!(ds, once);
    }

    #[test]
    fn missing_cells_compare_equal() {
        let ds = table(vec![
            vec![t("a"), Cell::Missing],
            vec![t("a"), Cell::Missing],
        ]);
        assert_eq!(duplicated(&ds), vec![false, true]);
    }

    #[test]
    fn signed_zero_is_one_value() {
        let ds = table(vec![
            vec![Cell::Float(0.0), t("k")],
            vec![Cell::Float(-0.0), t("k")],
        ]);
        assert_eq!(duplicated(&ds), vec![false, true]);
    }

    #[test]
    fn partial_match_is_not_duplicate() {
        let ds = table(vec![
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Int(1), Cell::Int(3)],
        ]);
        assert_eq!(duplicated(&ds), vec![false, false]);
    }

    #[test]
    fn removed_count_matches_row_delta() {
        let mut ds = table(vec![
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Int(1), Cell::Int(2)],
        ]);
        let before = ds.row_count();
        let removed = drop_duplicates(&mut ds);
        assert_eq!(removed, before - ds.row_count());
        assert_eq!(removed, 2);
    }
}
