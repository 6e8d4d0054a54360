//! Dataset cleaning: whitespace trimming, duplicate removal, and
//! missing-value fills.
//!
//! Cleaning runs in two phases so the profiler can measure missingness on
//! the deduplicated table before gaps are filled:
//!
//! 1. [`trim_and_dedup`] trims text cells and removes exact-duplicate rows.
//! 2. [`fill_missing`] fills numeric gaps with the column median and
//!    categorical gaps with the column mode. Datetime, identifier, and text
//!    gaps are left alone.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::{
    data::{Cell, Table},
    infer::ColumnKind,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub duplicates_removed: usize,
    pub cells_trimmed: usize,
    pub numeric_fills: usize,
    pub categorical_fills: usize,
}

/// Trim text cells and drop exact-duplicate rows (structural equality on
/// the trimmed row). Removing duplicates is idempotent.
pub fn trim_and_dedup(table: &Table) -> (Table, CleanReport) {
    let mut report = CleanReport::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(table.row_count());
    let mut cleaned = Table::new(table.headers.clone());

    for row in &table.rows {
        let mut trimmed_row = Vec::with_capacity(row.len());
        for cell in row {
            trimmed_row.push(trim_cell(cell, &mut report.cells_trimmed));
        }
        let key = row_key(&trimmed_row);
        if seen.insert(key) {
            cleaned.rows.push(trimmed_row);
        } else {
            report.duplicates_removed += 1;
        }
    }

    (cleaned, report)
}

fn trim_cell(cell: &Cell, trimmed_count: &mut usize) -> Cell {
    match cell {
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                if !s.is_empty() {
                    *trimmed_count += 1;
                }
                Cell::Null
            } else if trimmed.len() != s.len() {
                *trimmed_count += 1;
                Cell::Text(trimmed.to_string())
            } else {
                cell.clone()
            }
        }
        other => other.clone(),
    }
}

// Keys carry a variant tag so typed JSON/Excel cells never collide with
// text cells rendering to the same string.
fn row_key(row: &[Cell]) -> String {
    row.iter()
        .map(|cell| match cell {
            Cell::Null => String::from("n:"),
            Cell::Boolean(b) => format!("b:{b}"),
            Cell::Number(v) => format!("f:{v}"),
            Cell::Text(s) => format!("t:{s}"),
        })
        .join("\u{1f}")
}

/// Fill missing values in place on a copy of `table`: numeric columns get
/// the column median, categorical columns get the column mode.
pub fn fill_missing(table: &Table, kinds: &[ColumnKind], report: &mut CleanReport) -> Table {
    let mut filled = table.clone();

    for (idx, kind) in kinds.iter().enumerate() {
        let replacement = match kind {
            ColumnKind::Numeric => column_median(table, idx).map(Cell::Number),
            ColumnKind::Categorical => column_mode(table, idx).map(Cell::Text),
            _ => None,
        };
        let Some(replacement) = replacement else {
            continue;
        };
        for row in &mut filled.rows {
            if let Some(cell) = row.get_mut(idx)
                && cell.is_null()
            {
                *cell = replacement.clone();
                match kind {
                    ColumnKind::Numeric => report.numeric_fills += 1,
                    ColumnKind::Categorical => report.categorical_fills += 1,
                    _ => {}
                }
            }
        }
    }

    filled
}

fn column_median(table: &Table, index: usize) -> Option<f64> {
    let mut values: Vec<f64> = table
        .column_cells(index)
        .filter_map(Cell::as_number)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values[values.len() / 2])
}

/// Most frequent non-null value; ties break to the lexicographically
/// smallest value so fills are deterministic.
fn column_mode(table: &Table, index: usize) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for cell in table.column_cells(index) {
        if !cell.is_null() {
            *counts.entry(cell.as_display()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|v| {
                            if v.is_empty() {
                                Cell::Null
                            } else {
                                Cell::Text((*v).to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn duplicate_rows_are_removed_and_counted() {
        let input = table(
            &["a", "b"],
            &[&["1", "x"], &["1", "x"], &["2", "y"]],
        );
        let (cleaned, report) = trim_and_dedup(&input);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(cleaned.row_count(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = table(&["a"], &[&["1"], &["1"], &["2"]]);
        let (once, first) = trim_and_dedup(&input);
        let (twice, second) = trim_and_dedup(&once);
        assert_eq!(first.duplicates_removed, 1);
        assert_eq!(second.duplicates_removed, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn typed_and_text_cells_do_not_collide_in_dedup() {
        // A JSON number 1 and the string "1" render identically but are
        // structurally different rows.
        let input = Table {
            headers: vec!["v".into()],
            rows: vec![vec![Cell::Number(1.0)], vec![Cell::Text("1".into())]],
        };
        let (cleaned, report) = trim_and_dedup(&input);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(cleaned.row_count(), 2);
    }

    #[test]
    fn whitespace_is_trimmed_before_dedup() {
        let input = table(&["a"], &[&[" x "], &["x"]]);
        let (cleaned, report) = trim_and_dedup(&input);
        assert_eq!(cleaned.row_count(), 1);
        assert_eq!(report.duplicates_removed, 1);
        assert!(report.cells_trimmed >= 1);
    }

    #[test]
    fn numeric_gaps_get_the_column_median() {
        let input = table(&["v"], &[&["1"], &["3"], &["100"], &[""]]);
        let mut report = CleanReport::default();
        let filled = fill_missing(&input, &[ColumnKind::Numeric], &mut report);
        assert_eq!(filled.rows[3][0], Cell::Number(3.0));
        assert_eq!(report.numeric_fills, 1);
    }

    #[test]
    fn categorical_gaps_get_the_column_mode() {
        let input = table(&["s"], &[&["a"], &["a"], &["b"], &[""]]);
        let mut report = CleanReport::default();
        let filled = fill_missing(&input, &[ColumnKind::Categorical], &mut report);
        assert_eq!(filled.rows[3][0], Cell::Text("a".into()));
        assert_eq!(report.categorical_fills, 1);
    }

    #[test]
    fn datetime_and_identifier_gaps_are_left_alone() {
        let input = table(&["d"], &[&["2024-01-01"], &[""]]);
        let mut report = CleanReport::default();
        let filled = fill_missing(&input, &[ColumnKind::DateTime], &mut report);
        assert_eq!(filled.rows[1][0], Cell::Null);
        assert_eq!(report.numeric_fills + report.categorical_fills, 0);
    }
}
