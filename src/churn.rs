//! Churn-risk scoring per user.
//!
//! The reference date is the maximum date observed in the data, not the
//! wall clock, so historical datasets score reproducibly. The composite
//! score is a hand-tuned heuristic (recency 0-50, frequency 0-25, span
//! 0-25) and is not a calibrated probability.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::{Cell, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChurnUser {
    pub user: String,
    pub days_since_last_activity: i64,
    /// Events per distinct active day.
    pub avg_frequency: f64,
    /// Days between first and last event.
    pub span_days: i64,
    pub score: f64,
    pub risk: RiskLevel,
}

struct UserActivity {
    first: NaiveDateTime,
    last: NaiveDateTime,
    events: usize,
    active_days: HashSet<chrono::NaiveDate>,
}

/// Score churn risk per user, sorted by descending score.
///
/// Returns an empty vector when no parseable user/date pairs exist.
pub fn score(
    table: &Table,
    user_index: usize,
    date_index: usize,
    config: &AnalysisConfig,
) -> Vec<ChurnUser> {
    let mut users: HashMap<String, UserActivity> = HashMap::new();
    for row in &table.rows {
        let user = row.get(user_index).unwrap_or(&Cell::Null);
        let date = row.get(date_index).unwrap_or(&Cell::Null);
        if user.is_null() {
            continue;
        }
        let Some(timestamp) = date.as_datetime() else {
            continue;
        };
        let entry = users
            .entry(user.as_display())
            .or_insert_with(|| UserActivity {
                first: timestamp,
                last: timestamp,
                events: 0,
                active_days: HashSet::new(),
            });
        entry.first = entry.first.min(timestamp);
        entry.last = entry.last.max(timestamp);
        entry.events += 1;
        entry.active_days.insert(timestamp.date());
    }
    if users.is_empty() {
        return Vec::new();
    }

    let reference = users
        .values()
        .map(|a| a.last)
        .max()
        .expect("non-empty user map");

    let mut scored: Vec<ChurnUser> = users
        .into_iter()
        .map(|(user, activity)| {
            let days_since = (reference - activity.last).num_days();
            let span_days = (activity.last - activity.first).num_days();
            let avg_frequency = activity.events as f64 / activity.active_days.len() as f64;

            let recency = 50.0
                * (days_since as f64 / config.churn_recency_cap_days).clamp(0.0, 1.0);
            let frequency = 25.0
                * (1.0 - (avg_frequency / config.churn_frequency_cap).clamp(0.0, 1.0));
            let span = 25.0
                * (1.0 - (span_days as f64 / config.churn_span_cap_days).clamp(0.0, 1.0));
            let score = recency + frequency + span;

            ChurnUser {
                user,
                days_since_last_activity: days_since,
                avg_frequency,
                span_days,
                score,
                risk: bucket(score, config),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.user.cmp(&b.user))
    });
    scored
}

fn bucket(score: f64, config: &AnalysisConfig) -> RiskLevel {
    if score >= config.churn_critical_threshold {
        RiskLevel::Critical
    } else if score >= config.churn_high_threshold {
        RiskLevel::High
    } else if score >= config.churn_medium_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
