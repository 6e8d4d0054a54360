//! Descriptive statistics for numeric columns and the dataset quality
//! score.
//!
//! Quantiles use the `floor(n * p)` index into the sorted values with no
//! interpolation. All results are deterministic for a given input order.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub outliers: usize,
}

/// Summarize a numeric value array, or `None` when it is empty.
pub fn numeric_summary(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = sorted[quantile_index(n, 0.5)];
    let q1 = sorted[quantile_index(n, 0.25)];
    let q3 = sorted[quantile_index(n, 0.75)];
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;
    let outliers = sorted
        .iter()
        .filter(|v| **v < lower_bound || **v > upper_bound)
        .count();

    Some(NumericStats {
        min,
        max,
        mean,
        median,
        q1,
        q3,
        iqr,
        outliers,
    })
}

fn quantile_index(n: usize, p: f64) -> usize {
    ((n as f64 * p).floor() as usize).min(n - 1)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Composite 0-100 quality score.
///
/// The canonical score is completeness only:
/// `round((1 - missing/total) * 100)`. A nonzero
/// `duplicate_penalty_weight` additionally subtracts
/// `weight * duplicates/raw_rows * 100`, clamped to the [0, 100] range.
pub fn quality_score(
    missing_cells: usize,
    total_cells: usize,
    duplicates_removed: usize,
    raw_row_count: usize,
    duplicate_penalty_weight: f64,
) -> u8 {
    if total_cells == 0 {
        return 0;
    }
    let completeness = 1.0 - missing_cells as f64 / total_cells as f64;
    let mut score = completeness * 100.0;
    if duplicate_penalty_weight > 0.0 && raw_row_count > 0 {
        score -= duplicate_penalty_weight * (duplicates_removed as f64 / raw_row_count as f64)
            * 100.0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_orders_quartiles_and_counts_outliers() {
        // Scenario: one extreme value among small ones.
        let stats = numeric_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
        assert!(stats.iqr >= 0.0);
        assert_eq!(stats.outliers, 1, "100 should fall outside the IQR bounds");
    }

    #[test]
    fn summary_of_single_value_is_degenerate_but_valid() {
        let stats = numeric_summary(&[7.0]).unwrap();
        assert_eq!(stats.min, 7.0);
        assert_eq!(stats.median, 7.0);
        assert_eq!(stats.iqr, 0.0);
        assert_eq!(stats.outliers, 0);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(numeric_summary(&[]).is_none());
        assert!(mean(&[]).is_none());
        assert!(std_dev(&[]).is_none());
    }

    #[test]
    fn quality_score_tracks_completeness() {
        assert_eq!(quality_score(0, 100, 0, 10, 0.0), 100);
        assert_eq!(quality_score(25, 100, 0, 10, 0.0), 75);
        assert_eq!(quality_score(100, 100, 0, 10, 0.0), 0);
        assert_eq!(quality_score(0, 0, 0, 0, 0.0), 0);
    }

    #[test]
    fn quality_score_is_monotone_in_missing_ratio() {
        let mut previous = 100u8;
        for missing in 0..=50 {
            let score = quality_score(missing, 50, 2, 10, 0.0);
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn duplicate_penalty_only_applies_when_weighted() {
        let unweighted = quality_score(0, 100, 5, 10, 0.0);
        let weighted = quality_score(0, 100, 5, 10, 0.5);
        assert_eq!(unweighted, 100);
        assert_eq!(weighted, 75);
    }

    #[test]
    fn std_dev_is_population_form() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-9);
    }
}
