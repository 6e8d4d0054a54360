//! Rendering of analysis results: elastic tables for humans, JSON for
//! machines.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    anomaly::Anomaly,
    churn::ChurnUser,
    cohort::CohortRow,
    correlate::CorrelationMatrix,
    data::format_number,
    forecast::Forecast,
    funnel::FunnelStep,
    profile::DatasetAnalysis,
};

/// Serialize any analysis output as pretty JSON, to a file or stdout when
/// the path is `-` or absent.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::create(path)
                .with_context(|| format!("Creating output file {path:?}"))?;
            serde_json::to_writer_pretty(BufWriter::new(file), value)
                .with_context(|| format!("Writing JSON to {path:?}"))?;
        }
        _ => {
            let rendered =
                serde_json::to_string_pretty(value).context("Serializing result to JSON")?;
            println!("{rendered}");
        }
    }
    Ok(())
}

pub fn overview_headers() -> Vec<String> {
    ["column", "type", "missing", "unique", "min", "max", "mean", "median", "outliers"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn overview_rows(analysis: &DatasetAnalysis) -> Vec<Vec<String>> {
    analysis
        .columns
        .iter()
        .map(|column| {
            let (min, max, mean, median, outliers) = match &column.stats {
                Some(stats) => (
                    format_number(stats.min),
                    format_number(stats.max),
                    format_number(stats.mean),
                    format_number(stats.median),
                    stats.outliers.to_string(),
                ),
                None => match column.date_range {
                    Some((start, end)) => (
                        start.format("%Y-%m-%d").to_string(),
                        end.format("%Y-%m-%d").to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                    ),
                    None => Default::default(),
                },
            };
            vec![
                column.name.clone(),
                column.kind.to_string(),
                format!("{:.1}%", column.missing_percent),
                column.unique_count.to_string(),
                min,
                max,
                mean,
                median,
                outliers,
            ]
        })
        .collect()
}

pub fn stats_headers() -> Vec<String> {
    ["column", "min", "max", "mean", "median", "q1", "q3", "iqr", "outliers"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn stats_rows(analysis: &DatasetAnalysis) -> Vec<Vec<String>> {
    analysis
        .columns
        .iter()
        .filter_map(|column| {
            let stats = column.stats.as_ref()?;
            Some(vec![
                column.name.clone(),
                format_number(stats.min),
                format_number(stats.max),
                format_number(stats.mean),
                format_number(stats.median),
                format_number(stats.q1),
                format_number(stats.q3),
                format_number(stats.iqr),
                stats.outliers.to_string(),
            ])
        })
        .collect()
}

pub fn frequency_headers() -> Vec<String> {
    ["column", "value", "count", "percent"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn frequency_rows(analysis: &DatasetAnalysis) -> Vec<Vec<String>> {
    let total = analysis.row_count.max(1) as f64;
    analysis
        .columns
        .iter()
        .filter_map(|column| column.top_values.as_ref().map(|top| (column, top)))
        .flat_map(|(column, top)| {
            top.iter().map(move |entry| {
                vec![
                    column.name.clone(),
                    entry.value.clone(),
                    entry.count.to_string(),
                    format!("{:.2}%", entry.count as f64 / total * 100.0),
                ]
            })
        })
        .collect()
}

pub fn correlation_headers(matrix: &CorrelationMatrix) -> Vec<String> {
    let mut headers = vec!["column".to_string()];
    headers.extend(matrix.columns.iter().cloned());
    headers
}

pub fn correlation_rows(matrix: &CorrelationMatrix) -> Vec<Vec<String>> {
    matrix
        .columns
        .iter()
        .zip(&matrix.matrix)
        .map(|(name, row)| {
            let mut cells = vec![name.clone()];
            cells.extend(row.iter().map(|r| format!("{r:.3}")));
            cells
        })
        .collect()
}

pub fn cohort_headers(rows: &[CohortRow]) -> Vec<String> {
    let max_offsets = rows.iter().map(|r| r.retention.len()).max().unwrap_or(0);
    let mut headers = vec!["cohort".to_string(), "users".to_string()];
    headers.extend((0..max_offsets).map(|offset| format!("m{offset}")));
    headers
}

pub fn cohort_rows(rows: &[CohortRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut cells = vec![row.cohort.clone(), row.size.to_string()];
            cells.extend(row.retention.iter().map(|pct| format!("{pct:.1}%")));
            cells
        })
        .collect()
}

pub fn funnel_headers() -> Vec<String> {
    ["stage", "count", "percent", "dropoff"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn funnel_rows(steps: &[FunnelStep]) -> Vec<Vec<String>> {
    steps
        .iter()
        .map(|step| {
            vec![
                step.stage.clone(),
                step.count.to_string(),
                format!("{:.1}%", step.percent),
                format!("{:.1}%", step.dropoff),
            ]
        })
        .collect()
}

pub fn churn_headers() -> Vec<String> {
    ["user", "days_since_last", "avg_frequency", "span_days", "score", "risk"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn churn_rows(users: &[ChurnUser]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|user| {
            vec![
                user.user.clone(),
                user.days_since_last_activity.to_string(),
                format!("{:.2}", user.avg_frequency),
                user.span_days.to_string(),
                format!("{:.1}", user.score),
                user.risk.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn anomaly_headers() -> Vec<String> {
    ["column", "row", "value", "z_score", "kind", "severity"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn anomaly_rows(anomalies: &[Anomaly]) -> Vec<Vec<String>> {
    anomalies
        .iter()
        .map(|anomaly| {
            vec![
                anomaly.column.clone(),
                (anomaly.row + 1).to_string(),
                format_number(anomaly.value),
                format!("{:.2}", anomaly.z_score),
                anomaly.kind.as_str().to_string(),
                anomaly.severity.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn forecast_headers() -> Vec<String> {
    ["date", "forecast", "lower", "upper"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn forecast_rows(forecast: &Forecast) -> Vec<Vec<String>> {
    forecast
        .points
        .iter()
        .map(|point| {
            vec![
                point.date.format("%Y-%m-%d").to_string(),
                format_number(point.value),
                format_number(point.lower),
                format_number(point.upper),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::data::{Cell, Table};
    use crate::profile::analyze;

    fn sample_analysis() -> DatasetAnalysis {
        let table = Table {
            headers: vec!["amount".into(), "status".into()],
            rows: vec![
                vec![Cell::Text("1".into()), Cell::Text("a".into())],
                vec![Cell::Text("2".into()), Cell::Text("a".into())],
                vec![Cell::Text("3".into()), Cell::Text("b".into())],
                vec![Cell::Text("4".into()), Cell::Text("a".into())],
            ],
        };
        analyze(&table, &AnalysisConfig::default())
    }

    #[test]
    fn overview_has_one_row_per_column() {
        let analysis = sample_analysis();
        let rows = overview_rows(&analysis);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "amount");
        assert_eq!(rows[0][1], "numeric");
        assert_eq!(rows[1][1], "categorical");
    }

    #[test]
    fn stats_rows_cover_only_numeric_columns() {
        let analysis = sample_analysis();
        let rows = stats_rows(&analysis);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "amount");
        assert_eq!(rows[0].len(), stats_headers().len());
    }

    #[test]
    fn frequency_rows_report_percentages() {
        let analysis = sample_analysis();
        let rows = frequency_rows(&analysis);
        assert_eq!(rows[0][0], "status");
        assert_eq!(rows[0][1], "a");
        assert_eq!(rows[0][2], "3");
        assert_eq!(rows[0][3], "75.00%");
    }
}
