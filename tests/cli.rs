use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const TX_HEADER: &str = "trade_id,account_id,currency,amount,timestamp\n";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let p = self.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("dq-audit").unwrap();
        cmd.env("HOME", self.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.data_dir());
        cmd
    }
}

fn clean_inputs(ws: &Workspace) -> (PathBuf, PathBuf) {
    let tx = ws.write("tx.csv", &format!("{TX_HEADER}T1,A1,usd,100,2024-01-01\n"));
    let fx = ws.write("fx.csv", "currency,usd_rate\nUSD,1.0\n");
    (tx, fx)
}

#[test]
fn test_run_writes_report_and_audit_log() {
    let ws = Workspace::new();
    let (tx, fx) = clean_inputs(&ws);

    ws.cmd()
        .args(["run", "--run-id", "r1", "--transactions"])
        .arg(&tx)
        .arg("--fx")
        .arg(&fx)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data Quality Report generated"))
        .stdout(predicate::str::contains("All 5 checks passed"));

    let report_path = ws.data_dir().join("reports").join("dq_report_r1.json");
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["scanned_rows"], 1);
    assert_eq!(report["checks"].as_array().unwrap().len(), 5);
    assert!(report["checks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["status"] == "PASS" && c["failed_rows"] == 0));

    ws.cmd()
        .args(["history", "--run", "r1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fx_mapped"))
        .stdout(predicate::str::contains("r1"));
}

#[test]
fn test_run_reports_failures_without_aborting() {
    let ws = Workspace::new();
    let tx = ws.write(
        "tx.csv",
        &format!("{TX_HEADER},A1,USD,10,2024-01-01\nT2,A1,EUR,-5,bad\nT3,A2,USD,0,2024-01-02\n"),
    );
    let fx = ws.write("fx.csv", "currency,usd_rate\nUSD,1.0\n");

    ws.cmd()
        .args(["run", "--run-id", "bad-batch", "--transactions"])
        .arg(&tx)
        .arg("--fx")
        .arg(&fx)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 of 5 checks failed"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(ws.data_dir().join("reports").join("dq_report_bad-batch.json")).unwrap(),
    )
    .unwrap();
    let checks = report["checks"].as_array().unwrap();
    assert_eq!(checks[0]["check_name"], "no_null_trade_id");
    assert_eq!(checks[0]["sample_ids"], serde_json::json!([""]));
    assert_eq!(checks[1]["failed_rows"], 2);
    assert_eq!(checks[1]["sample_ids"], serde_json::json!(["T2", "T3"]));
    assert_eq!(checks[2]["severity"], "MEDIUM");
    assert_eq!(checks[3]["failed_rows"], checks[4]["failed_rows"]);
}

#[test]
fn test_missing_column_aborts_before_anything_is_written() {
    let ws = Workspace::new();
    let tx = ws.write("tx.csv", "trade_id,account_id,amount\nT1,A1,5\n");
    let fx = ws.write("fx.csv", "currency,usd_rate\nUSD,1.0\n");

    ws.cmd()
        .args(["run", "--run-id", "broken", "--transactions"])
        .arg(&tx)
        .arg("--fx")
        .arg(&fx)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required columns in transactions"))
        .stderr(predicate::str::contains("currency"));

    assert!(!ws.data_dir().join("reports").join("dq_report_broken.json").exists());
    assert!(!ws.data_dir().join("dq_audit.db").exists());
}

#[test]
fn test_check_json_is_dry_run() {
    let ws = Workspace::new();
    let tx = ws.write("tx.csv", &format!("{TX_HEADER}T1,A1,eur,5,2024-01-01\n"));
    let fx = ws.write("fx.csv", "currency,usd_rate\nUSD,1.0\n");

    let output = ws
        .cmd()
        .args(["check", "--json", "--transactions"])
        .arg(&tx)
        .arg("--fx")
        .arg(&fx)
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results[3]["check_name"], "currency_supported");
    assert_eq!(results[3]["status"], "FAIL");
    assert_eq!(results[4]["check_name"], "fx_mapped");
    assert_eq!(results[4]["failed_rows"], 1);

    assert!(!ws.data_dir().join("dq_audit.db").exists());
}

#[test]
fn test_fail_on_error_exit_code() {
    let ws = Workspace::new();
    let tx = ws.write("tx.csv", &format!("{TX_HEADER}T1,A1,USD,-1,2024-01-01\n"));
    let fx = ws.write("fx.csv", "currency,usd_rate\nUSD,1.0\n");

    ws.cmd()
        .args(["check", "--fail-on-error", "--transactions"])
        .arg(&tx)
        .arg("--fx")
        .arg(&fx)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("1 high severity check(s) failed"));
}

#[test]
fn test_history_zero_limit_and_latest_first() {
    let ws = Workspace::new();
    let (tx, fx) = clean_inputs(&ws);

    for run_id in ["first", "second"] {
        ws.cmd()
            .args(["run", "--run-id", run_id, "--transactions"])
            .arg(&tx)
            .arg("--fx")
            .arg(&fx)
            .assert()
            .success();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    ws.cmd()
        .args(["history", "--limit", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries."));

    ws.cmd()
        .args(["history", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("first").not());
}

#[test]
fn test_rules_lists_registry() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("no_null_trade_id"))
        .stdout(predicate::str::contains("amount_positive"))
        .stdout(predicate::str::contains("valid_timestamp"))
        .stdout(predicate::str::contains("currency_supported"))
        .stdout(predicate::str::contains("fx_mapped"));
}

#[test]
fn test_init_then_status() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized dq-audit"));
    assert!(ws.data_dir().join("dq_audit.db").exists());
    assert!(ws.path().join(".config").join("dq-audit").join("settings.json").exists());

    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Runs:          0"));
}
