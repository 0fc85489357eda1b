use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Binary pointed at `data_dir` with storage delays and failures disabled.
fn form_builder(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("form-builder");
    cmd.env_remove("FORM_BUILDER_DATA_DIR")
        .env_remove("FORM_BUILDER_LATENCY_MS")
        .env_remove("FORM_BUILDER_FAILURE_PROBABILITY")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir)
        .args(["--latency-ms", "0", "--failure-probability", "0"]);
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().expect("run form-builder");
    assert!(output.status.success(), "command failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn add_name_question(dir: &Path) {
    form_builder(dir)
        .args([
            "add",
            "--field",
            "inputType=text",
            "--field",
            "title=Full name",
            "--field",
            "isRequired=on",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question added successfully"));
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    form_builder(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("model-schema"))
        .stdout(predicate::str::contains("preview"));
}

#[test]
fn empty_store_lists_nothing() {
    let dir = TempDir::new().unwrap();
    form_builder(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No questions yet."));
}

#[test]
fn add_then_list() {
    let dir = TempDir::new().unwrap();
    add_name_question(dir.path());
    form_builder(dir.path())
        .args([
            "add",
            "-f",
            "inputType=options",
            "-f",
            "title=Favourite fruit",
            "-f",
            "option-0=apple",
            "-f",
            "option-1=pear",
        ])
        .assert()
        .success();

    form_builder(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("0. [text] Full name (required)"))
        .stdout(predicate::str::contains("1. [options] Favourite fruit"));

    let listed = json_stdout(form_builder(dir.path()).arg("list"));
    assert_eq!(listed["questions"].as_array().map(Vec::len), Some(2));
    assert_eq!(listed["questions"][1]["options"][1]["value"], "pear");
    assert!(dir.path().join("schema.json").exists());
}

#[test]
fn invalid_question_reports_field_errors() {
    let dir = TempDir::new().unwrap();
    form_builder(dir.path())
        .args(["add", "--field", "inputType=text", "--field", "title=ab"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "title: String must contain at least 3 character(s)",
        ))
        .stderr(predicate::str::contains("question definition is invalid"));
    assert!(!dir.path().join("schema.json").exists());
}

#[test]
fn submit_validates_against_stored_questions() {
    let dir = TempDir::new().unwrap();
    add_name_question(dir.path());

    form_builder(dir.path())
        .arg("submit")
        .assert()
        .failure()
        .stdout(predicate::str::contains("text-0: This field is required"));

    let submitted = json_stdout(form_builder(dir.path()).args(["submit", "-f", "text-0=Ada L"]));
    assert_eq!(submitted["data"]["text-0"], "Ada L");
    assert_eq!(submitted["notice"]["message"], "Form submitted successfully");
}

#[test]
fn update_and_remove_by_index() {
    let dir = TempDir::new().unwrap();
    add_name_question(dir.path());
    form_builder(dir.path())
        .args(["update", "0", "-f", "inputType=number", "-f", "title=Age"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 0 updated"));
    form_builder(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("0. [number] Age"));

    form_builder(dir.path())
        .args(["update", "4", "-f", "inputType=number", "-f", "title=Age"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Something went wrong while saving data",
        ));

    form_builder(dir.path())
        .args(["remove", "0"])
        .assert()
        .success();
    form_builder(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No questions yet."));
}

#[test]
fn draft_round_trip() {
    let dir = TempDir::new().unwrap();
    form_builder(dir.path())
        .args(["draft", "set", "-f", "inputType=text", "-f", "title=Unfinished"])
        .assert()
        .success();
    form_builder(dir.path())
        .args(["draft", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title=Unfinished"));
    form_builder(dir.path())
        .args(["draft", "clear"])
        .assert()
        .success();
    form_builder(dir.path())
        .args(["draft", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No draft saved."));
}

#[test]
fn preview_and_compile_describe_the_form() {
    let dir = TempDir::new().unwrap();
    add_name_question(dir.path());

    form_builder(dir.path())
        .args(["preview", "-f", "text-0=x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("text-0 [text] Full name (required)"))
        .stdout(predicate::str::contains(
            "error: String must contain at least 3 character(s)",
        ));

    let compiled = json_stdout(form_builder(dir.path()).arg("compile"));
    assert_eq!(compiled["required"][0], "text-0");
}

#[test]
fn view_toggle_needs_a_schema_and_persists() {
    let dir = TempDir::new().unwrap();
    form_builder(dir.path())
        .args(["view", "toggle"])
        .assert()
        .failure();

    add_name_question(dir.path());
    form_builder(dir.path())
        .args(["view", "toggle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("preview"));
    form_builder(dir.path())
        .args(["view", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("preview"));
}

#[test]
fn model_schema_needs_no_storage() {
    let dir = TempDir::new().unwrap();
    let schema = json_stdout(form_builder(dir.path()).arg("model-schema"));
    assert!(schema.get("oneOf").is_some() || schema.get("anyOf").is_some());
    assert!(!dir.path().join("schema.json").exists());
}

#[test]
fn settings_file_is_validated() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("form-builder.toml"), "latency = 1\n").unwrap();
    let mut cmd = cargo_bin_cmd!("form-builder");
    cmd.env_remove("FORM_BUILDER_LATENCY_MS")
        .env_remove("FORM_BUILDER_FAILURE_PROBABILITY")
        .env("FORM_BUILDER_DATA_DIR", dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to resolve configuration"));
}
