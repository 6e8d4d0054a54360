//! Column type inference.
//!
//! Each column is classified into one [`ColumnKind`] from a bounded sample
//! of its values. Classification accumulates per-kind match counts in a
//! [`KindCandidate`] and decides with fixed thresholds; ties resolve in the
//! priority order numeric > datetime > categorical > text. Columns whose
//! values are unique per row are flagged identifier-like and excluded from
//! numeric aggregation even when they parse as numbers.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::{
    config::AnalysisConfig,
    data::{Cell, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    DateTime,
    Text,
    Identifier,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Text => "text",
            ColumnKind::Identifier => "identifier",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn id_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(^id$|_id$|^uuid$|^guid$|^key$|_key$)").expect("valid identifier pattern")
    })
}

#[derive(Debug, Clone, Default)]
struct KindCandidate {
    sampled: usize,
    non_empty: usize,
    numeric_matches: usize,
    integer_matches: usize,
    datetime_matches: usize,
    guid_matches: usize,
    distinct: HashSet<String>,
}

impl KindCandidate {
    fn update(&mut self, cell: &Cell) {
        self.sampled += 1;
        if cell.is_null() {
            return;
        }
        self.non_empty += 1;

        if let Some(number) = cell.as_number() {
            self.numeric_matches += 1;
            if number.fract() == 0.0 {
                self.integer_matches += 1;
            }
        }
        if cell.as_datetime().is_some() {
            self.datetime_matches += 1;
        }
        if let Some(text) = cell.as_text() {
            let trimmed = text.trim().trim_matches(|c| matches!(c, '{' | '}'));
            if Uuid::parse_str(trimmed).is_ok() {
                self.guid_matches += 1;
            }
        }
        // Cleaning trims text cells later; count distinct values the way
        // they will look after that trim.
        self.distinct.insert(cell.as_display().trim().to_string());
    }

    fn decide(&self, name: &str, config: &AnalysisConfig) -> ColumnKind {
        if self.non_empty == 0 {
            return ColumnKind::Text;
        }
        let non_empty = self.non_empty as f64;
        let numeric_ratio = self.numeric_matches as f64 / non_empty;
        let datetime_ratio = self.datetime_matches as f64 / non_empty;

        if self.looks_like_identifier(name, config) {
            return ColumnKind::Identifier;
        }
        if numeric_ratio >= config.numeric_threshold {
            return ColumnKind::Numeric;
        }
        if datetime_ratio >= config.datetime_threshold {
            return ColumnKind::DateTime;
        }
        let cardinality_limit = config
            .max_categorical_cardinality
            .min(self.sampled.div_ceil(2).max(1));
        if self.distinct.len() <= cardinality_limit {
            return ColumnKind::Categorical;
        }
        ColumnKind::Text
    }

    /// A column is identifier-like when all sampled values are distinct and
    /// the values are GUIDs, whole numbers, or the name is id-shaped.
    fn looks_like_identifier(&self, name: &str, config: &AnalysisConfig) -> bool {
        if self.non_empty < config.identifier_min_rows {
            return id_name_pattern().is_match(name) && self.distinct.len() == self.non_empty;
        }
        if self.distinct.len() != self.non_empty {
            return false;
        }
        self.guid_matches == self.non_empty
            || self.integer_matches == self.non_empty
            || id_name_pattern().is_match(name)
    }
}

/// Classify every column of `table` from a sample of up to
/// `config.sample_rows` rows (0 samples the whole table).
pub fn infer_kinds(table: &Table, config: &AnalysisConfig) -> Vec<ColumnKind> {
    let sample_limit = if config.sample_rows == 0 {
        table.row_count()
    } else {
        config.sample_rows.min(table.row_count())
    };
    let mut candidates = vec![KindCandidate::default(); table.column_count()];

    for row in table.rows.iter().take(sample_limit) {
        for (idx, candidate) in candidates.iter_mut().enumerate() {
            candidate.update(row.get(idx).unwrap_or(&Cell::Null));
        }
    }

    candidates
        .iter()
        .zip(&table.headers)
        .map(|(candidate, name)| candidate.decide(name, config))
        .collect()
}
