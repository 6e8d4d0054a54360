//! The dataset profiling pipeline: inference, cleaning, per-column
//! descriptors, and the aggregate [`DatasetAnalysis`].
//!
//! `analyze` is the single entry point the CLI and the derived analyses
//! build on. It is a pure function of the input table plus config:
//! re-running it on the same input yields identical output.

use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

use crate::{
    clean,
    config::AnalysisConfig,
    data::{Cell, Table},
    infer::{self, ColumnKind},
    stats::{self, NumericStats},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
}

/// Per-column descriptor. `stats` is present only for numeric columns,
/// `top_values` only for categorical, `date_range` only for datetime.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_percent: f64,
    pub unique_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<NumericStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_values: Option<Vec<TopValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetAnalysis {
    pub raw_row_count: usize,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub quality_score: u8,
    pub missing_percent: f64,
    pub duplicates_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub cleaned: Table,
}

/// Profile and clean a raw table.
///
/// An empty input returns a zero-stats analysis with `column_count == 0`
/// rather than an error, so callers can render "nothing to show" panels.
pub fn analyze(table: &Table, config: &AnalysisConfig) -> DatasetAnalysis {
    if table.is_empty() {
        return DatasetAnalysis {
            raw_row_count: table.row_count(),
            row_count: 0,
            column_count: 0,
            columns: Vec::new(),
            quality_score: 0,
            missing_percent: 0.0,
            duplicates_removed: 0,
            date_range: None,
            cleaned: Table::new(Vec::new()),
        };
    }

    let raw_row_count = table.row_count();
    let kinds = infer::infer_kinds(table, config);
    let (deduped, mut report) = clean::trim_and_dedup(table);
    debug!(
        "Cleaned {} raw row(s): {} duplicate(s) removed, {} cell(s) trimmed",
        raw_row_count, report.duplicates_removed, report.cells_trimmed
    );

    // Missingness is measured after dedup but before fills, so the score
    // reflects what the source actually contained.
    let missing_cells: usize = deduped
        .rows
        .iter()
        .map(|row| row.iter().filter(|c| c.is_null()).count())
        .sum();
    let columns: Vec<ColumnProfile> = kinds
        .iter()
        .enumerate()
        .map(|(idx, kind)| profile_column(&deduped, idx, *kind, config))
        .collect();

    let total_cells = deduped.row_count() * deduped.column_count();
    let quality_score = stats::quality_score(
        missing_cells,
        total_cells,
        report.duplicates_removed,
        raw_row_count,
        config.duplicate_penalty_weight,
    );
    let missing_percent = if total_cells == 0 {
        0.0
    } else {
        missing_cells as f64 / total_cells as f64 * 100.0
    };
    let date_range = columns.iter().find_map(|c| c.date_range);

    let cleaned = clean::fill_missing(&deduped, &kinds, &mut report);

    DatasetAnalysis {
        raw_row_count,
        row_count: cleaned.row_count(),
        column_count: columns.len(),
        columns,
        quality_score,
        missing_percent,
        duplicates_removed: report.duplicates_removed,
        date_range,
        cleaned,
    }
}

fn profile_column(
    table: &Table,
    index: usize,
    kind: ColumnKind,
    config: &AnalysisConfig,
) -> ColumnProfile {
    let row_count = table.row_count();
    let missing = table.column_cells(index).filter(|c| c.is_null()).count();
    let missing_percent = if row_count == 0 {
        0.0
    } else {
        missing as f64 / row_count as f64 * 100.0
    };

    let mut distinct: Vec<String> = table
        .column_cells(index)
        .filter(|c| !c.is_null())
        .map(Cell::as_display)
        .collect();
    distinct.sort();
    distinct.dedup();
    let unique_count = distinct.len();

    let stats = match kind {
        ColumnKind::Numeric => {
            let values: Vec<f64> = table
                .column_cells(index)
                .filter_map(Cell::as_number)
                .collect();
            stats::numeric_summary(&values)
        }
        _ => None,
    };

    let top_values = match kind {
        ColumnKind::Categorical => Some(top_values(table, index, config.top_values)),
        _ => None,
    };

    let date_range = match kind {
        ColumnKind::DateTime => {
            let mut timestamps = table.column_cells(index).filter_map(Cell::as_datetime);
            timestamps.next().map(|first| {
                timestamps.fold((first, first), |(min, max), ts| (min.min(ts), max.max(ts)))
            })
        }
        _ => None,
    };

    ColumnProfile {
        name: table.headers[index].clone(),
        kind,
        missing_percent,
        unique_count,
        stats,
        top_values,
        date_range,
    }
}

/// Distinct values by descending count, ties broken by value, capped at
/// `top`.
pub fn top_values(table: &Table, index: usize, top: usize) -> Vec<TopValue> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for cell in table.column_cells(index) {
        if !cell.is_null() {
            *counts.entry(cell.as_display()).or_insert(0) += 1;
        }
    }
    let mut items: Vec<TopValue> = counts
        .into_iter()
        .map(|(value, count)| TopValue { value, count })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    if top > 0 && items.len() > top {
        items.truncate(top);
    }
    items
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
    fn analysis_counts_duplicates_and_keeps_invariants() {
        let input = table(
            &["x", "status"],
            &[
                &["1", "a"],
                &["1", "a"],
                &["2", "b"],
                &["3", "a"],
                &["4", "c"],
            ],
        );
        let analysis = analyze(&input, &AnalysisConfig::default());
        assert_eq!(analysis.raw_row_count, 5);
        assert_eq!(analysis.duplicates_removed, 1);
        assert_eq!(analysis.row_count, analysis.raw_row_count - 1);
        assert!(analysis.row_count <= analysis.raw_row_count);
        assert!(analysis.quality_score <= 100);
        assert_eq!(analysis.columns.len(), analysis.column_count);
    }

    #[test]
    fn categorical_column_reports_top_values() {
        let input = table(
            &["status"],
            &[&["a"], &["a"], &["b"], &["a"], &["c"]],
        );
        let analysis = analyze(&input, &AnalysisConfig::default());
        let column = &analysis.columns[0];
        assert_eq!(column.kind, ColumnKind::Categorical);
        assert_eq!(column.unique_count, 3);
        let top = column.top_values.as_ref().unwrap();
        assert_eq!(top[0], TopValue { value: "a".into(), count: 3 });
    }

    #[test]
    fn numeric_column_carries_stats_others_do_not() {
        let input = table(
            &["v", "status"],
            &[
                &["1", "a"],
                &["2", "b"],
                &["3", "a"],
                &["4", "b"],
                &["100", "a"],
            ],
        );
        let analysis = analyze(&input, &AnalysisConfig::default());
        let numeric = &analysis.columns[0];
        assert!(numeric.stats.is_some());
        assert!(numeric.top_values.is_none());
        assert_eq!(numeric.stats.as_ref().unwrap().outliers, 1);
        let categorical = &analysis.columns[1];
        assert!(categorical.stats.is_none());
        assert!(categorical.top_values.is_some());
    }

    #[test]
    fn datetime_column_exposes_its_range() {
        let input = table(
            &["day"],
            &[
                &["2024-01-03"],
                &["2024-01-01"],
                &["2024-01-05"],
                &["2024-01-02"],
            ],
        );
        let analysis = analyze(&input, &AnalysisConfig::default());
        let (start, end) = analysis.columns[0].date_range.unwrap();
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2024-01-01");
        assert_eq!(end.format("%Y-%m-%d").to_string(), "2024-01-05");
        assert_eq!(analysis.date_range, analysis.columns[0].date_range);
    }

    #[test]
    fn empty_table_yields_zero_stats_analysis() {
        let analysis = analyze(&Table::new(Vec::new()), &AnalysisConfig::default());
        assert_eq!(analysis.column_count, 0);
        assert_eq!(analysis.quality_score, 0);
        assert!(analysis.columns.is_empty());
    }

    #[test]
    fn missing_cells_lower_the_quality_score() {
        let complete = table(&["v"], &[&["1"], &["2"], &["3"], &["4"]]);
        let sparse = table(&["v"], &[&["1"], &[""], &[""], &["4"]]);
        let complete_score = analyze(&complete, &AnalysisConfig::default()).quality_score;
        let sparse_score = analyze(&sparse, &AnalysisConfig::default()).quality_score;
        assert!(sparse_score < complete_score);
        assert_eq!(complete_score, 100);
    }
}
