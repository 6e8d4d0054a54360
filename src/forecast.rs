//! Time-series forecasting: least-squares trend plus additive seasonal
//! decomposition.
//!
//! A closed-form linear regression supplies the trend, a centered moving
//! average with per-phase residual means supplies the seasonal component,
//! and the confidence band widens linearly with forecast distance.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::{Cell, Table},
};

/// Minimum number of daily points required to fit anything.
pub const MIN_SERIES_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub trend: TrendLine,
    pub period: usize,
    pub points: Vec<ForecastPoint>,
}

/// Aggregate a (date, value) column pair into a daily series: values are
/// summed per calendar day and the result is date-sorted.
pub fn daily_series(table: &Table, date_index: usize, value_index: usize) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in &table.rows {
        let date = row.get(date_index).unwrap_or(&Cell::Null);
        let value = row.get(value_index).unwrap_or(&Cell::Null);
        let (Some(timestamp), Some(number)) = (date.as_datetime(), value.as_number()) else {
            continue;
        };
        *totals.entry(timestamp.date()).or_insert(0.0) += number;
    }
    totals
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}

/// Fit and project a daily series, or `None` when it is too short.
pub fn project(series: &[SeriesPoint], config: &AnalysisConfig) -> Option<Forecast> {
    let n = series.len();
    if n < MIN_SERIES_LEN {
        return None;
    }
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let trend_line = fit_regression(&values);

    let period = 7.min(n / 3).max(2);
    let trend = centered_trend(&values, period);
    let seasonal = seasonal_components(&values, &trend, period);

    let residual_std = {
        let residuals: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| v - trend[i] - seasonal[i % period])
            .collect();
        crate::stats::std_dev(&residuals).unwrap_or(0.0)
    };

    let horizon = config
        .forecast_horizon_cap
        .min((0.3 * n as f64).ceil() as usize)
        .max(1);
    let last_date = series[n - 1].date;

    let points = (1..=horizon)
        .map(|step| {
            let index = (n - 1 + step) as f64;
            let value =
                trend_line.slope * index + trend_line.intercept + seasonal[(n - 1 + step) % period];
            let half_width = config.confidence_z
                * residual_std
                * (1.0 + step as f64 * config.confidence_widening);
            ForecastPoint {
                date: last_date
                    .checked_add_days(Days::new(step as u64))
                    .unwrap_or(last_date),
                value,
                lower: (value - half_width).max(0.0),
                upper: value + half_width,
            }
        })
        .collect();

    Some(Forecast {
        trend: trend_line,
        period,
        points,
    })
}

/// Closed-form least squares of value on index.
fn fit_regression(values: &[f64]) -> TrendLine {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    for (i, v) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        covariance += dx * (v - mean_y);
        var_x += dx * dx;
    }
    let slope = if var_x == 0.0 { 0.0 } else { covariance / var_x };
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let predicted = slope * i as f64 + intercept;
            (v - predicted) * (v - predicted)
        })
        .sum();
    let ss_tot: f64 = values.iter().map(|v| (v - mean_y) * (v - mean_y)).sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    TrendLine {
        slope,
        intercept,
        r_squared,
    }
}

/// Centered moving average of window `period`; the boundary positions a
/// centered window cannot cover are linearly extrapolated from the nearest
/// fitted points.
fn centered_trend(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![f64::NAN; n];

    for i in half..n {
        let start = i - half;
        if start + period > n {
            break;
        }
        let window = &values[start..start + period];
        trend[i] = window.iter().sum::<f64>() / period as f64;
    }

    let first_valid = trend.iter().position(|v| v.is_finite());
    let last_valid = trend.iter().rposition(|v| v.is_finite());
    let (Some(first), Some(last)) = (first_valid, last_valid) else {
        // Window never fit; fall back to the raw values.
        return values.to_vec();
    };

    let left_slope = if last > first {
        trend[first + 1] - trend[first]
    } else {
        0.0
    };
    for i in (0..first).rev() {
        trend[i] = trend[i + 1] - left_slope;
    }
    let right_slope = if last > first {
        trend[last] - trend[last - 1]
    } else {
        0.0
    };
    for i in (last + 1)..n {
        trend[i] = trend[i - 1] + right_slope;
    }
    trend
}

/// Mean detrended residual per phase within the period.
fn seasonal_components(values: &[f64], trend: &[f64], period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, v) in values.iter().enumerate() {
        let phase = i % period;
        sums[phase] += v - trend[i];
        counts[phase] += 1;
    }
    sums.iter()
        .zip(&counts)
        .map(|(sum, count)| if *count == 0 { 0.0 } else { sum / *count as f64 })
        .collect()
}
