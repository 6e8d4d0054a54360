//! Monthly cohort retention.
//!
//! Users are grouped by the calendar month of their first observed event;
//! each subsequent month offset reports the share of the cohort with at
//! least one event in that month.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::data::{Cell, Table};

#[derive(Debug, Clone, Serialize)]
pub struct CohortRow {
    /// Cohort month, formatted `YYYY-MM`.
    pub cohort: String,
    /// Users whose first event fell in this month.
    pub size: usize,
    /// Percentage of the cohort active at each month offset (index 0 = the
    /// cohort month itself, always 100 for non-empty cohorts).
    pub retention: Vec<f64>,
    /// Absolute active-user counts matching `retention`.
    pub counts: Vec<usize>,
}

/// Compute monthly retention per cohort.
///
/// Returns an empty vector when fewer than two distinct cohorts exist;
/// callers treat that as "not applicable".
pub fn retention(table: &Table, user_index: usize, date_index: usize) -> Vec<CohortRow> {
    // user -> set of month indices with activity
    let mut activity: HashMap<String, HashSet<i32>> = HashMap::new();
    for row in &table.rows {
        let user = row.get(user_index).unwrap_or(&Cell::Null);
        let date = row.get(date_index).unwrap_or(&Cell::Null);
        if user.is_null() {
            continue;
        }
        let Some(timestamp) = date.as_datetime() else {
            continue;
        };
        activity
            .entry(user.as_display())
            .or_default()
            .insert(month_index(&timestamp));
    }
    if activity.is_empty() {
        return Vec::new();
    }

    // cohort month -> (size, offset -> active users)
    let mut cohorts: BTreeMap<i32, (usize, BTreeMap<usize, usize>)> = BTreeMap::new();
    let max_month = activity
        .values()
        .flat_map(|months| months.iter().copied())
        .max()
        .unwrap_or(0);

    for months in activity.values() {
        let first = months.iter().copied().min().unwrap_or(0);
        let entry = cohorts.entry(first).or_default();
        entry.0 += 1;
        for month in months {
            let offset = (month - first) as usize;
            *entry.1.entry(offset).or_insert(0) += 1;
        }
    }
    if cohorts.len() < 2 {
        return Vec::new();
    }

    cohorts
        .into_iter()
        .map(|(cohort_month, (size, offsets))| {
            let horizon = (max_month - cohort_month) as usize;
            let counts: Vec<usize> = (0..=horizon)
                .map(|offset| offsets.get(&offset).copied().unwrap_or(0))
                .collect();
            let retention = counts
                .iter()
                .map(|count| *count as f64 / size as f64 * 100.0)
                .collect();
            CohortRow {
                cohort: month_label(cohort_month),
                size,
                retention,
                counts,
            }
        })
        .collect()
}

fn month_index(timestamp: &chrono::NaiveDateTime) -> i32 {
    use chrono::Datelike;
    timestamp.year() * 12 + timestamp.month0() as i32
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(rows: &[(&str, &str)]) -> Table {
        Table {
            headers: vec!["user".into(), "date".into()],
            rows: rows
                .iter()
                .map(|(user, date)| {
                    vec![Cell::Text(user.to_string()), Cell::Text(date.to_string())]
                })
                .collect(),
        }
    }

    #[test]
    fn two_cohorts_track_monthly_retention() {
        let table = events(&[
            // January cohort: u1 retained into February, u2 not.
            ("u1", "2024-01-05"),
            ("u2", "2024-01-20"),
            ("u1", "2024-02-10"),
            // February cohort: u3 only.
            ("u3", "2024-02-02"),
        ]);
        let rows = retention(&table, 0, 1);
        assert_eq!(rows.len(), 2);

        let january = &rows[0];
        assert_eq!(january.cohort, "2024-01");
        assert_eq!(january.size, 2);
        assert_eq!(january.counts, vec![2, 1]);
        assert_eq!(january.retention, vec![100.0, 50.0]);

        let february = &rows[1];
        assert_eq!(february.cohort, "2024-02");
        assert_eq!(february.size, 1);
        assert_eq!(february.retention, vec![100.0]);
    }

    #[test]
    fn single_cohort_is_not_applicable() {
        let table = events(&[("u1", "2024-03-01"), ("u2", "2024-03-15")]);
        assert!(retention(&table, 0, 1).is_empty());
    }

    #[test]
    fn rows_without_parseable_dates_are_skipped() {
        let table = events(&[
            ("u1", "2024-01-01"),
            ("u1", "not a date"),
            ("u2", "2024-02-01"),
        ]);
        let rows = retention(&table, 0, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].size, 1);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let table = events(&[]);
        assert!(retention(&table, 0, 1).is_empty());
    }
}
