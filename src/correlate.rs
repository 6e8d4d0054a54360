//! Pairwise Pearson correlation over numeric columns.

use serde::Serialize;

use crate::{
    data::{Cell, Table},
    infer::ColumnKind,
    profile::ColumnProfile,
};

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

/// Correlate every pair of numeric columns, capped at `cap` columns to
/// bound the O(k^2 * n) cost. The matrix is symmetric with a unit
/// diagonal; a pair with zero variance on either side correlates as 0.
///
/// Returns `None` when fewer than two numeric columns exist.
pub fn matrix(
    table: &Table,
    profiles: &[ColumnProfile],
    cap: usize,
) -> Option<CorrelationMatrix> {
    let selected: Vec<(usize, &str)> = profiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind == ColumnKind::Numeric)
        .take(cap.max(2))
        .map(|(idx, p)| (idx, p.name.as_str()))
        .collect();
    if selected.len() < 2 {
        return None;
    }

    let series: Vec<Vec<f64>> = selected
        .iter()
        .map(|(idx, _)| {
            table
                .column_cells(*idx)
                .map(|c| c.as_number().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    let k = selected.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..k {
        matrix[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&series[i], &series[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    Some(CorrelationMatrix {
        columns: selected.iter().map(|(_, name)| name.to_string()).collect(),
        matrix,
    })
}

/// Pearson coefficient over the rows where both values are present.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}
