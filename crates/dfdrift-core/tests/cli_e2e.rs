//! End-to-end tests for the dfdrift binary.
//!
//! Every test points `--config` or `XDG_CONFIG_HOME` at a temp directory so
//! a developer's own config never leaks in.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dfdrift(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dfdrift").expect("dfdrift binary should exist");
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("DFDRIFT_CONFIG")
        .env_remove("DFDRIFT_LOG")
        .env_remove("DFDRIFT_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// One JSON Lines trace of `complete` events.
fn trace_line(activities: &[&str]) -> String {
    let events: Vec<serde_json::Value> = activities
        .iter()
        .map(|a| serde_json::json!({"concept:name": a, "lifecycle:transition": "complete"}))
        .collect();
    serde_json::Value::Array(events).to_string()
}

fn write_traces(dir: &Path, name: &str, traces: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    let body: String = traces.iter().map(|t| trace_line(t) + "\n").collect();
    fs::write(&path, body).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

mod compare {
    use super::*;

    #[test]
    fn identical_files_have_zero_distance() {
        let dir = TempDir::new().unwrap();
        let a = write_traces(dir.path(), "a.jsonl", &[&["A", "B", "C"], &["A", "C"]]);
        let b = write_traces(dir.path(), "b.jsonl", &[&["A", "B", "C"], &["A", "C"]]);

        let output = dfdrift(&dir).arg("compare").arg(&a).arg(&b).output().unwrap();
        assert_eq!(output.status.code(), Some(0));

        let report = stdout_json(&output);
        assert_eq!(report["distance"], 0.0);
        assert_eq!(report["chi_square"]["statistic"], 0.0);
        assert_eq!(report["chi_square"]["df"], 2);
        assert_eq!(report["significant"], false);
    }

    #[test]
    fn disjoint_behavior_is_significant() {
        let dir = TempDir::new().unwrap();
        let a_traces: Vec<&[&str]> = vec![&["A", "B", "C"]; 30];
        let b_traces: Vec<&[&str]> = vec![&["C", "B", "A"]; 30];
        let a = write_traces(dir.path(), "a.jsonl", &a_traces);
        let b = write_traces(dir.path(), "b.jsonl", &b_traces);

        let output = dfdrift(&dir).arg("compare").arg(&a).arg(&b).output().unwrap();
        assert_eq!(output.status.code(), Some(1));

        let report = stdout_json(&output);
        assert_eq!(report["significant"], true);
        assert!(report["chi_square"]["p_value"].as_f64().unwrap() < 0.05);
        assert!(report["distance"].as_f64().unwrap() > 0.0);
        assert!(report["critical_value"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn table_lists_aligned_counts() {
        let dir = TempDir::new().unwrap();
        let a = write_traces(dir.path(), "a.jsonl", &[&["A", "B"], &["A", "B"]]);
        let b = write_traces(dir.path(), "b.jsonl", &[&["C", "D"], &["C", "D"], &["C", "D"]]);

        dfdrift(&dir)
            .args(["compare", "--table"])
            .arg(&a)
            .arg(&b)
            .assert()
            .stdout(predicate::str::contains("key\tleft\tright"))
            .stdout(predicate::str::contains("A+complete -> B+complete\t2\t0"))
            .stdout(predicate::str::contains("C+complete -> D+complete\t0\t3"));
    }

    #[test]
    fn table_with_single_category_fails_like_summary() {
        let dir = TempDir::new().unwrap();
        let a = write_traces(dir.path(), "a.jsonl", &[&["A", "B"]]);

        let output = dfdrift(&dir)
            .args(["compare", "--table"])
            .arg(&a)
            .arg(&a)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(11));
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines[0], "key\tleft\tright");
        assert_eq!(lines[1], "A+complete -> B+complete\t1\t1");
        let err: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(err["error"]["code"], 32);
    }

    #[test]
    fn single_category_is_an_input_error() {
        let dir = TempDir::new().unwrap();
        let a = write_traces(dir.path(), "a.jsonl", &[&["A", "B"]]);

        let output = dfdrift(&dir).arg("compare").arg(&a).arg(&a).output().unwrap();
        assert_eq!(output.status.code(), Some(11));
        let body = stdout_json(&output);
        assert_eq!(body["error"]["code"], 32);
        assert_eq!(body["error"]["category"], "comparison");
    }

    #[test]
    fn activity_kind_counts_labels() {
        let dir = TempDir::new().unwrap();
        let a = write_traces(dir.path(), "a.jsonl", &[&["A", "B", "A"]]);
        let b = write_traces(dir.path(), "b.jsonl", &[&["A", "B", "B"]]);

        let output = dfdrift(&dir)
            .args(["compare", "--kind", "activity"])
            .arg(&a)
            .arg(&b)
            .output()
            .unwrap();
        let report = stdout_json(&output);
        assert_eq!(report["kind"], "activity");
        assert_eq!(report["left"]["total"], 3.0);
        assert_eq!(report["chi_square"]["df"], 1);
    }
}

mod watch {
    use super::*;

    fn observations(output: &std::process::Output) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn drift_sets_exit_code() {
        let dir = TempDir::new().unwrap();
        let traces = write_traces(dir.path(), "t.jsonl", &[&["A", "B", "A", "C"], &["A", "B"]]);

        let output = dfdrift(&dir).arg("watch").arg(&traces).output().unwrap();
        assert_eq!(output.status.code(), Some(1));

        let obs = observations(&output);
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0]["index"], 0);
        assert_eq!(obs[0]["drifted"], true);
        assert_eq!(obs[0]["total"], 3.0);
        assert_eq!(obs[1]["total"], 4.0);
    }

    #[test]
    fn warmup_ignores_initial_drift() {
        let dir = TempDir::new().unwrap();
        let repeated: Vec<&[&str]> = vec![&["A", "B"]; 5];
        let traces = write_traces(dir.path(), "t.jsonl", &repeated);

        let output = dfdrift(&dir)
            .args(["watch", "--warmup", "1"])
            .arg(&traces)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        let obs = observations(&output);
        assert_eq!(obs[0]["drifted"], true);
        assert!(obs[1..].iter().all(|o| o["drifted"] == false));
    }

    #[test]
    fn reference_comparison_is_reported() {
        let dir = TempDir::new().unwrap();
        let reference = write_traces(dir.path(), "ref.jsonl", &[&["A", "B", "C"], &["A", "C"]]);
        let traces = write_traces(dir.path(), "t.jsonl", &[&["A", "B", "C"]]);

        let output = dfdrift(&dir)
            .args(["watch", "--reference"])
            .arg(&reference)
            .arg(&traces)
            .output()
            .unwrap();
        let obs = observations(&output);
        assert!(obs[0]["reference"]["distance"].as_f64().unwrap() > 0.0);
        assert!(obs[0]["reference"].get("significant").is_some());
    }

    #[test]
    fn malformed_line_is_an_input_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, format!("{}\n{{broken\n", trace_line(&["A", "B"]))).unwrap();

        let output = dfdrift(&dir).arg("watch").arg(&path).output().unwrap();
        assert_eq!(output.status.code(), Some(11));
        let lines: Vec<&str> = std::str::from_utf8(&output.stdout).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        let err: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(err["error"]["code"], 20);
        assert_eq!(err["error"]["context"]["line"], 2);
    }

    #[test]
    fn missing_attribute_is_reported_with_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.jsonl");
        fs::write(
            &path,
            r#"[{"concept:name":"A","lifecycle:transition":"complete"},{"concept:name":"B"}]"#,
        )
        .unwrap();

        let output = dfdrift(&dir).arg("watch").arg(&path).output().unwrap();
        assert_eq!(output.status.code(), Some(11));
        let body = stdout_json(&output);
        assert_eq!(body["error"]["code"], 30);
        assert_eq!(body["error"]["context"]["event_index"], 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        dfdrift(&dir)
            .args(["watch", "/nonexistent/traces.jsonl"])
            .assert()
            .code(21);
    }

    #[test]
    fn jsonl_logs_go_to_stderr() {
        let dir = TempDir::new().unwrap();
        let traces = write_traces(dir.path(), "t.jsonl", &[&["A", "B"]]);

        let output = dfdrift(&dir)
            .args(["watch", "--log-format", "jsonl"])
            .arg(&traces)
            .output()
            .unwrap();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first: serde_json::Value = serde_json::from_str(stderr.lines().next().unwrap()).unwrap();
        assert_eq!(first["event"], "run.started");
        assert!(first["run_id"].as_str().unwrap().starts_with("run-"));
        // stdout carries only observations
        assert_eq!(observations(&output).len(), 1);
    }
}

mod config {
    use super::*;

    #[test]
    fn show_defaults() {
        let dir = TempDir::new().unwrap();
        let output = dfdrift(&dir).args(["config", "show"]).output().unwrap();
        assert!(output.status.success());
        let body = stdout_json(&output);
        assert_eq!(body["source"], "default");
        assert_eq!(body["config"]["epsilon"], 0.01);
        assert_eq!(body["config"]["kind"], "directly_follows");
    }

    #[test]
    fn show_reads_xdg_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dfdrift")).unwrap();
        fs::write(
            dir.path().join("dfdrift").join("dfdrift.json"),
            r#"{"schema_version":"1.0.0","alpha":0.01}"#,
        )
        .unwrap();

        let output = dfdrift(&dir).args(["config", "show"]).output().unwrap();
        let body = stdout_json(&output);
        assert_eq!(body["source"], "xdg");
        assert_eq!(body["config"]["alpha"], 0.01);
        assert_eq!(body["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn validate_rejects_bad_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"alpha": 2.0}"#).unwrap();

        let output = dfdrift(&dir)
            .args(["config", "validate"])
            .arg(&path)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(12));
        assert_eq!(stdout_json(&output)["error"]["code"], 11);
    }

    #[test]
    fn validate_accepts_good_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good.json");
        fs::write(&path, r#"{"epsilon": 0.2, "apply_mode": "atomic"}"#).unwrap();

        dfdrift(&dir)
            .args(["config", "validate"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""valid":true"#));
    }

    #[test]
    fn cli_override_is_validated() {
        let dir = TempDir::new().unwrap();
        let traces = write_traces(dir.path(), "t.jsonl", &[&["A", "B"]]);
        dfdrift(&dir)
            .args(["watch", "--epsilon=-1"])
            .arg(&traces)
            .assert()
            .code(12);
    }
}

mod args {
    use super::*;

    #[test]
    fn unknown_command_is_args_error() {
        let dir = TempDir::new().unwrap();
        dfdrift(&dir)
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn bad_kind_is_args_error() {
        let dir = TempDir::new().unwrap();
        dfdrift(&dir)
            .args(["compare", "--kind", "histogram", "a", "b"])
            .assert()
            .code(10);
    }

    #[test]
    fn watch_help_explains_first_trace_drift() {
        let dir = TempDir::new().unwrap();
        dfdrift(&dir)
            .args(["watch", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--warmup"))
            .stdout(predicate::str::contains("always"))
            .stdout(predicate::str::contains("empty history"));
    }

    #[test]
    fn help_succeeds() {
        let dir = TempDir::new().unwrap();
        dfdrift(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("watch"));
    }
}
