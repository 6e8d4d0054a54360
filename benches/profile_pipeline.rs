use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use dataset_insights::config::AnalysisConfig;
use dataset_insights::data::{Cell, Table};
use dataset_insights::profile;

fn synthetic_table(rows: usize) -> Table {
    let statuses = ["new", "active", "closed"];
    let mut table = Table::new(vec![
        "order_id".to_string(),
        "amount".to_string(),
        "status".to_string(),
        "order_date".to_string(),
    ]);
    for i in 0..rows {
        table.rows.push(vec![
            Cell::Text(format!("ord-{i}")),
            Cell::Text(format!("{}.{:02}", 10 + i % 90, i % 100)),
            Cell::Text(statuses[i % statuses.len()].to_string()),
            Cell::Text(format!("2024-{:02}-{:02}", 1 + (i / 28) % 12, 1 + i % 28)),
        ]);
    }
    table
}

fn bench_analyze(c: &mut Criterion) {
    let config = AnalysisConfig::default();
    let table = synthetic_table(10_000);
    c.bench_function("analyze_10k_rows", |b| {
        b.iter(|| profile::analyze(black_box(&table), &config))
    });
}

fn bench_numeric_summary(c: &mut Criterion) {
    let values: Vec<f64> = (0..100_000).map(|i| (i % 977) as f64).collect();
    c.bench_function("numeric_summary_100k", |b| {
        b.iter(|| dataset_insights::stats::numeric_summary(black_box(&values)))
    });
}

criterion_group!(benches, bench_analyze, bench_numeric_summary);
criterion_main!(benches);
