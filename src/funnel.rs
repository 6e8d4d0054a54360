//! Heuristic funnel detection over categorical stage columns.
//!
//! Picks the categorical column that most looks like a funnel stage
//! (name token match, bounded cardinality), orders its values by the
//! canonical stage sequence when they match it, otherwise by descending
//! count, and reports per-step conversion and drop-off.

use log::debug;
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::Table,
    infer::ColumnKind,
    profile::{self, ColumnProfile},
};

#[derive(Debug, Clone, Serialize)]
pub struct FunnelStep {
    pub stage: String,
    pub count: usize,
    /// Percent of the first step's count.
    pub percent: f64,
    /// Percent lost versus the previous step (0 for the first step).
    pub dropoff: f64,
}

/// Detect a funnel in `table`, or return an empty vector when no column
/// qualifies.
pub fn detect(
    table: &Table,
    profiles: &[ColumnProfile],
    config: &AnalysisConfig,
) -> Vec<FunnelStep> {
    let Some(stage_index) = pick_stage_column(table, profiles, config) else {
        return Vec::new();
    };
    debug!(
        "Funnel stage column: '{}'",
        table.headers[stage_index]
    );

    let mut stages = profile::top_values(table, stage_index, 0);
    if stages.len() < 2 {
        return Vec::new();
    }
    order_stages(&mut stages, config);

    let first_count = stages[0].count as f64;
    let mut previous = stages[0].count as f64;
    stages
        .iter()
        .enumerate()
        .map(|(idx, stage)| {
            let count = stage.count as f64;
            let dropoff = if idx == 0 || previous == 0.0 {
                0.0
            } else {
                (1.0 - count / previous) * 100.0
            };
            previous = count;
            FunnelStep {
                stage: stage.value.clone(),
                count: stage.count,
                percent: if first_count == 0.0 {
                    0.0
                } else {
                    count / first_count * 100.0
                },
                dropoff,
            }
        })
        .collect()
}

/// Prefer a categorical column whose name carries a stage token; fall back
/// to the lowest-cardinality categorical column within bounds.
fn pick_stage_column(
    table: &Table,
    profiles: &[ColumnProfile],
    config: &AnalysisConfig,
) -> Option<usize> {
    let candidates: Vec<(usize, &ColumnProfile)> = profiles
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            p.kind == ColumnKind::Categorical
                && p.unique_count >= 2
                && p.unique_count <= config.max_funnel_stages
        })
        .collect();

    candidates
        .iter()
        .find(|(_, p)| {
            let lowered = p.name.to_ascii_lowercase();
            config
                .stage_column_tokens
                .iter()
                .any(|token| lowered.contains(token.as_str()))
        })
        .or_else(|| {
            candidates
                .iter()
                .min_by_key(|(_, p)| p.unique_count)
        })
        .map(|(idx, _)| *idx)
        .filter(|idx| table.column_index(&profiles[*idx].name).is_some())
}

/// Reorder in place by the canonical sequence when at least half the
/// stages appear in it; otherwise keep descending count order.
fn order_stages(stages: &mut [profile::TopValue], config: &AnalysisConfig) {
    let position = |value: &str| -> Option<usize> {
        let lowered = value.to_ascii_lowercase();
        config
            .stage_order
            .iter()
            .position(|known| lowered.contains(known.as_str()))
    };
    let known = stages.iter().filter(|s| position(&s.value).is_some()).count();
    if known * 2 >= stages.len() {
        stages.sort_by_key(|s| position(&s.value).unwrap_or(usize::MAX));
    }
}
