//! Tuning configuration for the analysis heuristics.
//!
//! Every hand-tuned constant in the inference, churn, funnel, anomaly, and
//! forecasting heuristics lives here so it can be overridden from a YAML
//! file instead of being buried in the code. Defaults are the canonical
//! values; a config file only needs to name the fields it changes.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Rows sampled per column during type inference (0 = full scan).
    pub sample_rows: usize,
    /// Fraction of non-empty samples that must parse as numbers.
    pub numeric_threshold: f64,
    /// Fraction of non-empty samples that must parse as dates/datetimes.
    pub datetime_threshold: f64,
    /// Distinct-value ceiling for a categorical column.
    pub max_categorical_cardinality: usize,
    /// Minimum rows before the unique-per-row identifier check applies.
    pub identifier_min_rows: usize,
    /// Distinct values reported per categorical column.
    pub top_values: usize,
    /// Maximum numeric columns entering the correlation matrix.
    pub correlation_cap: usize,
    /// Weight of the duplicate-row ratio in the quality score (0 disables).
    pub duplicate_penalty_weight: f64,
    /// Z-score magnitude at which a value is flagged as spike/drop.
    pub anomaly_z_threshold: f64,
    /// Z-score magnitudes for high and medium severity.
    pub anomaly_z_high: f64,
    pub anomaly_z_medium: f64,
    /// Maximum anomalies reported after sorting.
    pub max_anomalies: usize,
    /// Churn recency saturates at this many days since last activity.
    pub churn_recency_cap_days: f64,
    /// Churn frequency saturates at this many events per active day.
    pub churn_frequency_cap: f64,
    /// Churn span saturates at this many days between first and last event.
    pub churn_span_cap_days: f64,
    /// Risk bucket thresholds: low < medium < high < critical.
    pub churn_medium_threshold: f64,
    pub churn_high_threshold: f64,
    pub churn_critical_threshold: f64,
    /// Column-name tokens that mark a funnel stage column.
    pub stage_column_tokens: Vec<String>,
    /// Canonical stage ordering used when stage values match it.
    pub stage_order: Vec<String>,
    /// Cardinality ceiling for a funnel stage column.
    pub max_funnel_stages: usize,
    /// Future points forecast, capped regardless of series length.
    pub forecast_horizon_cap: usize,
    /// Normal quantile for the confidence band.
    pub confidence_z: f64,
    /// Per-step widening factor for the confidence band.
    pub confidence_widening: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rows: 100,
            numeric_threshold: 0.8,
            datetime_threshold: 0.7,
            max_categorical_cardinality: 20,
            identifier_min_rows: 10,
            top_values: 10,
            correlation_cap: 6,
            duplicate_penalty_weight: 0.0,
            anomaly_z_threshold: 2.5,
            anomaly_z_high: 4.0,
            anomaly_z_medium: 3.0,
            max_anomalies: 20,
            churn_recency_cap_days: 30.0,
            churn_frequency_cap: 5.0,
            churn_span_cap_days: 90.0,
            churn_medium_threshold: 25.0,
            churn_high_threshold: 50.0,
            churn_critical_threshold: 75.0,
            stage_column_tokens: vec![
                "stage".to_string(),
                "step".to_string(),
                "funnel".to_string(),
                "phase".to_string(),
                "status".to_string(),
            ],
            stage_order: vec![
                "visit".to_string(),
                "view".to_string(),
                "signup".to_string(),
                "trial".to_string(),
                "activation".to_string(),
                "purchase".to_string(),
                "retention".to_string(),
            ],
            max_funnel_stages: 12,
            forecast_horizon_cap: 7,
            confidence_z: 1.96,
            confidence_widening: 0.15,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: AnalysisConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
