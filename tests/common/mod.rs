use std::{fs::File, io::Write, path::PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub fn bin() -> Command {
    Command::cargo_bin("dataset-insights").expect("binary builds")
}

pub fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).expect("create fixture");
    file.write_all(contents.as_bytes()).expect("write fixture");
    path
}

/// A small customer table with one exact duplicate row and one missing
/// amount.
pub const MESSY_CSV: &str = "\
name,amount,category,signup_date
alice,10,a,2024-01-01
bob,12,b,2024-01-02
carol,11,a,2024-01-03
dave,13,c,2024-01-04
erin,9,b,2024-01-05
frank,14,a,2024-01-06
grace,,a,2024-01-07
heidi,12,b,2024-01-08
ivan,10,c,2024-01-09
judy,11,a,2024-01-10
mallory,13,b,2024-01-11
alice,10,a,2024-01-01
";

/// User activity events spanning two calendar months, with one spiked
/// amount. Serves the cohort, churn, funnel, anomaly, and forecast tests.
pub const EVENTS_CSV: &str = "\
user_id,event_date,stage,amount
u1,2024-01-01,signup,10
u2,2024-01-03,signup,10
u1,2024-01-05,purchase,10
u2,2024-01-07,signup,10
u1,2024-01-09,signup,10
u2,2024-01-11,signup,10
u1,2024-01-13,purchase,10
u2,2024-01-15,signup,10
u1,2024-02-02,signup,10
u1,2024-02-04,purchase,10
u3,2024-02-06,signup,10
u3,2024-02-08,signup,10
u1,2024-02-10,signup,500
u3,2024-02-12,purchase,10
";
