//! Anomaly detection over numeric columns.
//!
//! Values are flagged as spikes or drops by z-score magnitude, with IQR
//! violations not already flagged reported as plain outliers. Columns with
//! zero standard deviation carry no signal and are skipped.

use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::{Cell, Table},
    infer::ColumnKind,
    profile::ColumnProfile,
    stats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Spike,
    Drop,
    Outlier,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Spike => "spike",
            AnomalyKind::Drop => "drop",
            AnomalyKind::Outlier => "outlier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub column: String,
    /// Zero-based row index in the cleaned table.
    pub row: usize,
    pub value: f64,
    pub z_score: f64,
    pub kind: AnomalyKind,
    pub severity: Severity,
}

/// Detect anomalies in every numeric column, sorted by severity then
/// |z| descending, truncated to `config.max_anomalies`.
pub fn detect(
    table: &Table,
    profiles: &[ColumnProfile],
    config: &AnalysisConfig,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for (index, profile) in profiles.iter().enumerate() {
        if profile.kind != ColumnKind::Numeric {
            continue;
        }
        let values: Vec<(usize, f64)> = table
            .column_cells(index)
            .enumerate()
            .filter_map(|(row, cell)| cell.as_number().map(|v| (row, v)))
            .collect();
        let numbers: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        let Some(mean) = stats::mean(&numbers) else {
            continue;
        };
        let Some(std_dev) = stats::std_dev(&numbers) else {
            continue;
        };
        if std_dev == 0.0 {
            continue;
        }
        let summary = stats::numeric_summary(&numbers);
        let bounds = summary.map(|s| (s.q1 - 1.5 * s.iqr, s.q3 + 1.5 * s.iqr));

        for (row, value) in values {
            let z = (value - mean) / std_dev;
            if z.abs() >= config.anomaly_z_threshold {
                let kind = if z > 0.0 {
                    AnomalyKind::Spike
                } else {
                    AnomalyKind::Drop
                };
                anomalies.push(Anomaly {
                    column: profile.name.clone(),
                    row,
                    value,
                    z_score: z,
                    kind,
                    severity: severity(z.abs(), config),
                });
            } else if let Some((lower, upper)) = bounds
                && (value < lower || value > upper)
            {
                anomalies.push(Anomaly {
                    column: profile.name.clone(),
                    row,
                    value,
                    z_score: z,
                    kind: AnomalyKind::Outlier,
                    severity: Severity::Low,
                });
            }
        }
    }

    anomalies.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.z_score.abs().total_cmp(&a.z_score.abs()))
    });
    anomalies.truncate(config.max_anomalies);
    anomalies
}

fn severity(z_magnitude: f64, config: &AnalysisConfig) -> Severity {
    if z_magnitude >= config.anomaly_z_high {
        Severity::High
    } else if z_magnitude >= config.anomaly_z_medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}
