//! Runs the built `keyclass` binary end to end.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

const DICTIONARY_YAML: &str = r#"
categories:
  - { id: 1, name: Animals }
  - { id: 2, name: Finance }
keywords:
  - { key: cat, percent: "0.8", category_id: 1 }
  - { key: bank, percent: "1.5", category_id: 2 }
"#;

fn keyclass(storage: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_keyclass"))
        .arg("--storage-dir")
        .arg(storage)
        .args(args)
        .env("KEYCLASS_LOG", "debug")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn run_prints_only_json_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let dictionary = dir.path().join("dictionary.yaml");
    std::fs::write(&dictionary, DICTIONARY_YAML).unwrap();

    let output = keyclass(
        &dir.path().join("store"),
        &["run", "--dictionary", dictionary.to_str().unwrap(), "--text", "Cat, cat and a bank"],
    );
    let result = stdout_json(&output);

    assert_eq!(result["predicted_category"], "Animals");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Loaded dictionary"));
}

#[test]
fn stored_workflow_keeps_stdout_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("store");
    let dictionary_file = dir.path().join("dictionary.yaml");
    std::fs::write(&dictionary_file, DICTIONARY_YAML).unwrap();

    let dictionary = stdout_json(&keyclass(
        &storage,
        &["dictionary", "add", "--name", "demo", "--file", dictionary_file.to_str().unwrap()],
    ));
    let document = stdout_json(&keyclass(
        &storage,
        &["document", "add", "--name", "memo", "--text", "bank bank"],
    ));

    let record = stdout_json(&keyclass(
        &storage,
        &[
            "classify",
            "--document",
            document["id"].as_str().unwrap(),
            "--dictionary",
            dictionary["id"].as_str().unwrap(),
        ],
    ));
    assert_eq!(record["classification_result"]["predicted_category"], "Finance");
    assert_eq!(record["database_id"], dictionary["id"]);
}

#[test]
fn failures_exit_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = keyclass(dir.path(), &["classification", "get", "not-an-id"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("❌"));
}
