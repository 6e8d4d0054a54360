pub mod anomaly;
pub mod churn;
pub mod clean;
pub mod cli;
pub mod cohort;
pub mod columns;
pub mod config;
pub mod correlate;
pub mod data;
pub mod forecast;
pub mod funnel;
pub mod infer;
pub mod ingest;
pub mod io_utils;
pub mod profile;
pub mod report;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, EventArgs, ForecastArgs, InputArgs},
    columns::Role,
    config::AnalysisConfig,
    data::Table,
    profile::DatasetAnalysis,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dataset_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Frequency(args) => handle_frequency(&args),
        Commands::Correlate(args) => handle_correlate(&args),
        Commands::Cohort(args) => handle_cohort(&args),
        Commands::Funnel(args) => handle_funnel(&args),
        Commands::Churn(args) => handle_churn(&args),
        Commands::Anomalies(args) => handle_anomalies(&args),
        Commands::Forecast(args) => handle_forecast(&args),
    }
}

fn load_input(args: &InputArgs) -> Result<(Table, AnalysisConfig)> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = ingest::load_table(&args.input, args.delimiter, encoding)
        .with_context(|| format!("Loading {:?}", args.input))?;
    let config = AnalysisConfig::load_or_default(args.config.as_deref())?;
    Ok((table, config))
}

fn analyzed_input(args: &InputArgs) -> Result<(DatasetAnalysis, AnalysisConfig)> {
    let (table, config) = load_input(args)?;
    let analysis = profile::analyze(&table, &config);
    Ok((analysis, config))
}

fn handle_analyze(args: &cli::AnalyzeArgs) -> Result<()> {
    let (mut analysis, _) = analyzed_input(&args.input)?;
    info!(
        "Analyzed {} row(s) across {} column(s): quality {}, {} duplicate(s) removed",
        analysis.row_count,
        analysis.column_count,
        analysis.quality_score,
        analysis.duplicates_removed
    );
    if args.input.json {
        if !args.include_rows {
            analysis.cleaned.rows.clear();
        }
        return report::write_json(&analysis, args.input.output.as_deref());
    }
    table::print_table(&report::overview_headers(), &report::overview_rows(&analysis));
    println!(
        "rows: {} (raw {})  quality: {}/100  missing: {:.1}%  duplicates removed: {}",
        analysis.row_count,
        analysis.raw_row_count,
        analysis.quality_score,
        analysis.missing_percent,
        analysis.duplicates_removed
    );
    Ok(())
}

fn handle_stats(args: &InputArgs) -> Result<()> {
    let (analysis, _) = analyzed_input(args)?;
    let rows = report::stats_rows(&analysis);
    if rows.is_empty() {
        return Err(anyhow!(
            "No numeric columns available for summary statistics"
        ));
    }
    if args.json {
        let numeric: Vec<_> = analysis
            .columns
            .iter()
            .filter(|c| c.stats.is_some())
            .collect();
        return report::write_json(&numeric, args.output.as_deref());
    }
    table::print_table(&report::stats_headers(), &rows);
    info!("Computed summary statistics for {} column(s)", rows.len());
    Ok(())
}

fn handle_frequency(args: &InputArgs) -> Result<()> {
    let (analysis, _) = analyzed_input(args)?;
    let rows = report::frequency_rows(&analysis);
    if rows.is_empty() {
        return Err(anyhow!(
            "No categorical columns available for frequency analysis"
        ));
    }
    if args.json {
        let categorical: Vec<_> = analysis
            .columns
            .iter()
            .filter(|c| c.top_values.is_some())
            .collect();
        return report::write_json(&categorical, args.output.as_deref());
    }
    table::print_table(&report::frequency_headers(), &rows);
    info!("Computed frequency counts");
    Ok(())
}

fn handle_correlate(args: &InputArgs) -> Result<()> {
    let (analysis, config) = analyzed_input(args)?;
    let matrix = correlate::matrix(&analysis.cleaned, &analysis.columns, config.correlation_cap);
    if args.json {
        return report::write_json(&matrix, args.output.as_deref());
    }
    match matrix {
        Some(matrix) => {
            table::print_table(
                &report::correlation_headers(&matrix),
                &report::correlation_rows(&matrix),
            );
        }
        None => info!("Fewer than two numeric columns; nothing to correlate"),
    }
    Ok(())
}

fn resolve_event_columns(
    analysis: &DatasetAnalysis,
    args: &EventArgs,
) -> Result<(usize, usize)> {
    let user = match &args.user_column {
        Some(name) => analysis.cleaned.require_column(name)?,
        None => {
            let profile = columns::resolve(&analysis.columns, Role::User)
                .ok_or_else(|| anyhow!("No user-like column found; pass --user-column"))?;
            analysis.cleaned.require_column(&profile.name)?
        }
    };
    let date = match &args.date_column {
        Some(name) => analysis.cleaned.require_column(name)?,
        None => {
            let profile = columns::resolve(&analysis.columns, Role::Date)
                .ok_or_else(|| anyhow!("No date column found; pass --date-column"))?;
            analysis.cleaned.require_column(&profile.name)?
        }
    };
    Ok((user, date))
}

fn handle_cohort(args: &EventArgs) -> Result<()> {
    let (analysis, _) = analyzed_input(&args.input)?;
    let (user, date) = resolve_event_columns(&analysis, args)?;
    let rows = cohort::retention(&analysis.cleaned, user, date);
    if args.input.json {
        return report::write_json(&rows, args.input.output.as_deref());
    }
    if rows.is_empty() {
        info!("Fewer than two cohorts; retention not applicable");
        return Ok(());
    }
    table::print_table(&report::cohort_headers(&rows), &report::cohort_rows(&rows));
    info!("Computed retention for {} cohort(s)", rows.len());
    Ok(())
}

fn handle_funnel(args: &InputArgs) -> Result<()> {
    let (analysis, config) = analyzed_input(args)?;
    let steps = funnel::detect(&analysis.cleaned, &analysis.columns, &config);
    if args.json {
        return report::write_json(&steps, args.output.as_deref());
    }
    if steps.is_empty() {
        info!("No funnel-like categorical column found");
        return Ok(());
    }
    table::print_table(&report::funnel_headers(), &report::funnel_rows(&steps));
    info!("Detected funnel with {} stage(s)", steps.len());
    Ok(())
}

fn handle_churn(args: &EventArgs) -> Result<()> {
    let (analysis, config) = analyzed_input(&args.input)?;
    let (user, date) = resolve_event_columns(&analysis, args)?;
    let users = churn::score(&analysis.cleaned, user, date, &config);
    if args.input.json {
        return report::write_json(&users, args.input.output.as_deref());
    }
    if users.is_empty() {
        info!("No user activity with parseable dates; churn not applicable");
        return Ok(());
    }
    table::print_table(&report::churn_headers(), &report::churn_rows(&users));
    info!("Scored churn risk for {} user(s)", users.len());
    Ok(())
}

fn handle_anomalies(args: &InputArgs) -> Result<()> {
    let (analysis, config) = analyzed_input(args)?;
    let anomalies = anomaly::detect(&analysis.cleaned, &analysis.columns, &config);
    if args.json {
        return report::write_json(&anomalies, args.output.as_deref());
    }
    if anomalies.is_empty() {
        info!("No anomalies detected");
        return Ok(());
    }
    table::print_table(&report::anomaly_headers(), &report::anomaly_rows(&anomalies));
    info!("Flagged {} anomalous value(s)", anomalies.len());
    Ok(())
}

fn handle_forecast(args: &ForecastArgs) -> Result<()> {
    let (analysis, config) = analyzed_input(&args.input)?;
    let date = match &args.date_column {
        Some(name) => analysis.cleaned.require_column(name)?,
        None => {
            let profile = columns::resolve(&analysis.columns, Role::Date)
                .ok_or_else(|| anyhow!("No date column found; pass --date-column"))?;
            analysis.cleaned.require_column(&profile.name)?
        }
    };
    let value = match &args.value_column {
        Some(name) => analysis.cleaned.require_column(name)?,
        None => {
            let profile = columns::resolve(&analysis.columns, Role::Value)
                .ok_or_else(|| anyhow!("No numeric column found; pass --value-column"))?;
            analysis.cleaned.require_column(&profile.name)?
        }
    };

    let series = forecast::daily_series(&analysis.cleaned, date, value);
    let projection = forecast::project(&series, &config);
    if args.input.json {
        return report::write_json(&projection, args.input.output.as_deref());
    }
    match projection {
        Some(projection) => {
            println!(
                "trend: slope {:.4}, r2 {:.3}, seasonal period {}",
                projection.trend.slope, projection.trend.r_squared, projection.period
            );
            table::print_table(
                &report::forecast_headers(),
                &report::forecast_rows(&projection),
            );
            info!("Forecast {} future point(s)", projection.points.len());
        }
        None => info!(
            "Series has {} point(s); at least {} required",
            series.len(),
            forecast::MIN_SERIES_LEN
        ),
    }
    Ok(())
}
