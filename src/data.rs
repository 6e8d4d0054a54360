//! Core data model: untyped cells, in-memory tables, and parse helpers.
//!
//! Every input format (CSV/TSV/JSON) is normalized into a [`Table`] of
//! [`Cell`] scalars before any analysis runs. Row order is insertion order
//! from the source file and is preserved by every operation that does not
//! explicitly re-sort.

use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An untyped scalar as parsed from the source file.
///
/// CSV ingestion produces only `Null` and `Text`; JSON ingestion can also
/// produce `Number` and `Boolean` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell, coercing numeric-looking strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_numeric_token(s),
            _ => None,
        }
    }

    /// Temporal view of the cell, trying datetime then date formats.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Text(s) => parse_temporal_token(s),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Boolean(b) => b.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A rectangular, in-memory dataset. Rows are positional against `headers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.headers.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("Column '{name}' not found in input"))
    }

    /// Iterate the cells of one column, padding short rows with `Null`.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&Cell::Null))
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parse a datetime or date token, normalizing dates to midnight.
pub fn parse_temporal_token(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = parse_naive_datetime(trimmed) {
        return Some(dt);
    }
    parse_naive_date(trimmed)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric token, tolerating currency symbols, thousands
/// separators, and a trailing percent sign.
pub fn parse_numeric_token(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            '$' | '€' | '£' | '¥' | ',' | '%' => {}
            other => cleaned.push(other),
        }
    }
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
