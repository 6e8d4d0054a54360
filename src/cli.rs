use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile, clean, and analyze tabular datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile a dataset: types, cleaning, per-column stats, quality score
    Analyze(AnalyzeArgs),
    /// Summary statistics for numeric columns
    Stats(InputArgs),
    /// Frequency counts for categorical columns
    Frequency(InputArgs),
    /// Pearson correlation matrix over numeric columns
    Correlate(InputArgs),
    /// Monthly cohort retention from user/date events
    Cohort(EventArgs),
    /// Detect a funnel in a categorical stage column
    Funnel(InputArgs),
    /// Score churn risk per user from user/date events
    Churn(EventArgs),
    /// Flag z-score and IQR anomalies in numeric columns
    Anomalies(InputArgs),
    /// Forecast a daily-aggregated numeric series
    Forecast(ForecastArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file (.csv, .tsv, .xlsx, .xls, or .json); '-' reads CSV from stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding analysis tuning constants
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Write output to this file instead of stdout (JSON mode only)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Include the cleaned rows in JSON output
    #[arg(long = "include-rows")]
    pub include_rows: bool,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Column identifying the user (auto-detected if omitted)
    #[arg(long = "user-column")]
    pub user_column: Option<String>,
    /// Event date column (auto-detected if omitted)
    #[arg(long = "date-column")]
    pub date_column: Option<String>,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Date column to aggregate by day (auto-detected if omitted)
    #[arg(long = "date-column")]
    pub date_column: Option<String>,
    /// Numeric column to forecast (auto-detected if omitted)
    #[arg(long = "value-column")]
    pub value_column: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
