//! End-to-end tests of the `alertql` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const ALERTQL: &str = "alertql";

const UI_TREE: &str = r#"{
  "groupId": "root",
  "label": "and",
  "items": [
    {"id": "c1", "column": "age", "operator": ">", "value": 30},
    {"groupId": "g1", "label": "or", "items": [
      {"id": "c2", "column": "city", "operator": "=", "value": "delhi"},
      {"id": "c3", "column": "city", "operator": "=", "value": "mumbai"}
    ]}
  ]
}"#;

fn alertql(config_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin(ALERTQL).unwrap();
    cmd.arg("--config").arg(config_dir.path().join("alertql.toml"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("to-backend"))
        .stdout(predicate::str::contains("from-backend"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn to_backend_from_stdin() {
    let dir = tempdir().unwrap();
    let output = alertql(&dir)
        .arg("to-backend")
        .write_stdin(UI_TREE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let backend: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(backend["and"][0]["column"], "age");
    assert_eq!(backend["and"][1]["or"][1]["value"], "mumbai");
}

#[test]
fn from_backend_with_id_prefix() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .args(["from-backend", "--id-prefix", "n"])
        .write_stdin(r#"{"or": [{"column": "level", "operator": "=", "value": "error"}]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""groupId": "n-1""#))
        .stdout(predicate::str::contains(r#""id": "n-2""#));
}

#[test]
fn where_clause_from_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tree.json");
    std::fs::write(&input, UI_TREE).unwrap();

    alertql(&dir)
        .arg("where")
        .arg(&input)
        .assert()
        .success()
        .stdout("WHERE age > '30' AND (city = 'delhi' OR city = 'mumbai')\n");
}

#[test]
fn sql_honours_config_file() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("alertql.toml"),
        "[sql]\nkey_alias = \"bucket\"\n",
    )
    .unwrap();

    alertql(&dir)
        .arg("sql")
        .write_stdin(r#"{"stream_name": "default"}"#)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "SELECT histogram(_timestamp) AS bucket, COUNT(*) as zo_sql_val",
        ));
}

#[test]
fn validate_rejects_unnamed_alert() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .arg("validate")
        .write_stdin(r#"{"stream_name": "default"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Alert name is required"));
}

#[test]
fn validate_prints_payload() {
    let dir = tempdir().unwrap();
    let form = format!(
        r#"{{"name": "city_watch", "stream_name": "default", "destinations": ["email"],
            "query_condition": {{"type": "custom", "conditions": {UI_TREE}}}}}"#
    );

    alertql(&dir)
        .args(["validate", "--editor", "ops"])
        .write_stdin(form)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""lastEditedBy": "ops""#))
        .stdout(predicate::str::contains(r#""and": ["#));
}

#[test]
fn cron_reports_bad_field() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .args(["cron", "0 75 * * * ?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minute must be between 0 and 59"));
}

#[test]
fn config_prints_defaults() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("key_alias = \"zo_sql_key\""))
        .stdout(predicate::str::contains("max_group_depth = 2"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("alertql.toml"), "[editor]\nmax_group_depth = 0\n").unwrap();

    alertql(&dir)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("editor.max_group_depth"));
}

#[test]
fn new_form_then_add_group() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("alertql.toml"), "[editor]\nroot_label = \"and\"\n").unwrap();

    let form = alertql(&dir)
        .args(["new-form", "--id-prefix", "f"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let form: serde_json::Value = serde_json::from_slice(&form).unwrap();
    let tree = form["query_condition"]["conditions"].to_string();
    assert_eq!(form["query_condition"]["conditions"]["label"], "and");

    alertql(&dir)
        .args(["edit", "--action", "add-group", "--target", "f-1", "--label", "or"])
        .args(["--id-prefix", "e"])
        .write_stdin(tree)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""groupId": "e-1""#))
        .stdout(predicate::str::contains(r#""label": "or""#));
}

#[test]
fn edit_unknown_group_fails() {
    let dir = tempdir().unwrap();
    alertql(&dir)
        .args(["edit", "--action", "toggle", "--target", "nope"])
        .write_stdin(UI_TREE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("condition group `nope` not found"));
}

#[test]
fn validate_keeps_leaf_with_mistyped_flag() {
    let dir = tempdir().unwrap();
    let form = r#"{"name": "city_watch", "stream_name": "default", "destinations": ["email"],
        "query_condition": {"type": "custom", "conditions": {"label": "and", "items": [
            {"column": "city", "operator": "=", "value": "delhi", "ignore_case": "yes"}
        ]}}}"#;

    alertql(&dir)
        .arg("validate")
        .write_stdin(form)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""column": "city""#));
}
