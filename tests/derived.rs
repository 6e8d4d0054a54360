mod common;

use common::{EVENTS_CSV, bin, write_fixture};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn cohort_tracks_monthly_retention() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args(["cohort", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01"))
        .stdout(predicate::str::contains("2024-02"))
        .stdout(predicate::str::contains("m0"))
        // January cohort: one of two users returns in February.
        .stdout(predicate::str::contains("50.0%"));
}

#[test]
fn cohort_resolves_explicit_column_names() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args([
            "cohort",
            "--user-column",
            "user_id",
            "--date-column",
            "event_date",
            "-i",
        ])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01"));
}

#[test]
fn cohort_rejects_unknown_columns() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args(["cohort", "--user-column", "nonexistent", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn churn_buckets_dormant_users_as_high_risk() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args(["churn", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("risk"))
        // u2 went quiet weeks before the data ends.
        .stdout(predicate::str::contains("critical"));
}

#[test]
fn funnel_orders_known_stages_canonically() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    let output = bin()
        .args(["funnel", "-i"])
        .arg(&input)
        .output()
        .expect("run funnel");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    let signup = stdout.find("signup").expect("signup stage present");
    let purchase = stdout.find("purchase").expect("purchase stage present");
    assert!(signup < purchase, "signup must precede purchase:\n{stdout}");
}

#[test]
fn anomalies_flag_the_spiked_amount() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args(["anomalies", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("amount"))
        .stdout(predicate::str::contains("spike"));
}

#[test]
fn forecast_projects_the_daily_series() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    bin()
        .args(["forecast", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("trend:"))
        .stdout(predicate::str::contains("forecast"))
        .stdout(predicate::str::contains("lower"));
}

#[test]
fn forecast_json_carries_confidence_bounds() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    let output = bin()
        .args(["forecast", "--json", "-i"])
        .arg(&input)
        .output()
        .expect("run forecast");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    let points = parsed["points"].as_array().expect("points");
    assert!(!points.is_empty());
    for point in points {
        let lower = point["lower"].as_f64().expect("lower");
        let value = point["value"].as_f64().expect("value");
        let upper = point["upper"].as_f64().expect("upper");
        assert!(lower <= value && value <= upper);
        assert!(lower >= 0.0);
    }
}

#[test]
fn correlate_with_one_numeric_column_is_not_applicable() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(&dir, "events.csv", EVENTS_CSV);

    let output = bin()
        .args(["correlate", "--json", "-i"])
        .arg(&input)
        .output()
        .expect("run correlate");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "null");
}

#[test]
fn correlate_reports_a_symmetric_matrix() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_fixture(
        &dir,
        "pairs.csv",
        "x,y\n1,2\n2,4\n3,6\n4,8\n5,10\n",
    );

    let output = bin()
        .args(["correlate", "--json", "-i"])
        .arg(&input)
        .output()
        .expect("run correlate");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    let matrix = parsed["matrix"].as_array().expect("matrix");
    assert_eq!(matrix.len(), 2);
    assert!((matrix[0][1].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(matrix[0][1], matrix[1][0]);
}
