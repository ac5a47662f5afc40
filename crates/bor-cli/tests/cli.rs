//! End-to-end tests for the `bor` binary.

use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const WORKED_MASTER: &str = "82ae621bd6fc543b1320949cb839939e5a7be0c1af9a4260b53718bec1453b72";

fn bor(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bor").unwrap();
    cmd.arg("--store-root").arg(root);
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.arg("--json").output().unwrap();
    serde_json::from_slice(&out.stdout).unwrap()
}

fn save_worked(root: &Path, backend: &str) {
    bor(root)
        .args(["--backend", backend, "run", "--initial", "3", "--config", r#"{"offset": 2}"#])
        .args(["--version", "v1.0", "--stages", "add", "square", "--label", "worked"])
        .assert()
        .success();
}

fn edit_record(root: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
    let path = root.join("worked.json");
    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    edit(&mut json);
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
}

/// Flip the last hex digit of a fingerprint string.
fn flip(hex: &serde_json::Value) -> serde_json::Value {
    let mut s = hex.as_str().unwrap().to_string();
    let last = if s.ends_with('0') { "1" } else { "0" };
    s.replace_range(s.len() - 1.., last);
    serde_json::Value::String(s)
}

#[test]
fn test_steps_lists_builtins() {
    let dir = TempDir::new().unwrap();
    let out = json_stdout(bor(dir.path()).arg("steps"));
    let names: Vec<&str> = out["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names, ["add", "square", "double", "negate", "increment", "identity"]);
}

#[test]
fn test_run_worked_example() {
    let dir = TempDir::new().unwrap();
    let out = json_stdout(bor(dir.path()).args([
        "run", "--initial", "3", "--config", r#"{"offset": 2}"#, "--version", "v1.0", "--stages",
        "add", "square",
    ]));
    assert_eq!(out["output"], 25);
    assert_eq!(out["num_steps"], 2);
    assert_eq!(out["master"], WORKED_MASTER);
    assert!(out["saved"].is_null());
}

#[test]
fn test_run_save_then_verify_json_backend() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");
    assert!(dir.path().join("worked.json").exists());

    let out = json_stdout(bor(dir.path()).args(["verify", "worked", "--guard"]));
    assert_eq!(out["ok"], true);
    assert_eq!(out["master"], WORKED_MASTER);
}

#[test]
fn test_run_save_then_verify_sqlite_backend() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "sqlite");
    assert!(dir.path().join("proofs.db").exists());

    bor(dir.path())
        .args(["--backend", "sqlite", "verify", "worked"])
        .assert()
        .success();
}

#[test]
fn test_show_and_list() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");

    let out = json_stdout(bor(dir.path()).args(["show", "worked"]));
    assert_eq!(out["label"], "worked");
    assert_eq!(out["proof"]["steps"], serde_json::json!(["add", "square"]));
    assert_eq!(out["proof"]["master"], WORKED_MASTER);

    let out = json_stdout(bor(dir.path()).arg("list"));
    assert_eq!(out["labels"], serde_json::json!(["worked"]));
}

#[test]
fn test_verify_override_initial_is_stage_mismatch() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");

    bor(dir.path())
        .args(["verify", "worked", "--initial", "4"])
        .assert()
        .code(3);
}

#[test]
fn test_verify_override_stages_is_length_mismatch() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");

    bor(dir.path())
        .args(["verify", "worked", "--stages", "add"])
        .assert()
        .code(2);
}

#[test]
fn test_tampered_stage_hash_exit_code() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");
    edit_record(dir.path(), |json| {
        let flipped = flip(&json["stage_hashes"][0]);
        json["stage_hashes"][0] = flipped.clone();
        json["proof"]["stage_hashes"][0] = flipped;
    });

    let out = bor(dir.path())
        .args(["--json", "verify", "worked"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let err: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(err["ok"], false);
    assert_eq!(err["kind"], "stage_mismatch");
}

#[test]
fn test_tampered_master_exit_code() {
    let dir = TempDir::new().unwrap();
    save_worked(dir.path(), "json");
    edit_record(dir.path(), |json| {
        let flipped = flip(&json["master"]);
        json["master"] = flipped.clone();
        json["proof"]["master"] = flipped;
    });

    bor(dir.path()).args(["verify", "worked"]).assert().code(4);
}

#[test]
fn test_other_errors_exit_one() {
    let dir = TempDir::new().unwrap();

    // missing label
    bor(dir.path()).args(["verify", "nope"]).assert().code(1);
    // unknown step
    bor(dir.path())
        .args(["run", "--initial", "1", "--stages", "cube"])
        .assert()
        .code(1);
    // step failure
    bor(dir.path())
        .args(["run", "--initial", r#""x""#, "--stages", "square"])
        .assert()
        .code(1);
    // null has no canonical form
    bor(dir.path())
        .args(["run", "--initial", "null", "--stages", "identity"])
        .assert()
        .code(1);
}
