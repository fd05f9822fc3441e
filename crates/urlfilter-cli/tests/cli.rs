#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DEFINITION: &str = r#"
entity = "Customer"
default_configuration = "adults"

[entities.Customer]
name = "string"
age = "integer"
address = { reference = "Address" }
version = { type = "integer", system = true }

[entities.Address]
city = "string"

[access]
hidden = ["address"]

[[configurations]]
id = "adults"
name = "Adults"
kind = "design-time"

[[configurations.conditions]]
property = "age"
operation = "ge"
value = "18"
locked = true

[[configurations]]
id = "mine"
"#;

struct Workspace {
    dir: TempDir,
    definition: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let definition = dir.path().join("customers.toml");
    fs::write(&definition, DEFINITION).unwrap();
    Workspace { dir, definition }
}

fn urlfilter(ws: &Workspace) -> Command {
    let mut cmd = Command::new(cargo_bin("urlfilter"));
    cmd.current_dir(ws.dir.path())
        .env_remove("URLFILTER_CONFIGURATION_PARAM")
        .env_remove("URLFILTER_CONDITION_PARAM")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn encode_default_configuration() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["encode", "-d"])
        .arg(&ws.definition)
        .assert()
        .success()
        .stdout(predicate::str::contains("genericFilterConfiguration=adults"))
        .stdout(predicate::str::contains(
            "genericFilterCondition=property%3Aage%7Cge%7C18",
        ));
}

#[test]
fn encode_empty_run_time_configuration() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["encode", "-c", "mine", "-d"])
        .arg(&ws.definition)
        .assert()
        .success()
        .stdout(predicate::str::contains("genericFilterConfiguration=mine"))
        .stdout(predicate::str::contains("genericFilterCondition").not());
}

#[test]
fn apply_condition_only_url_uses_empty_configuration() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["apply", "-d"])
        .arg(&ws.definition)
        .arg("genericFilterCondition=property:name|eq|John")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration: <empty> (run-time)"))
        .stdout(predicate::str::contains("name eq \"John\""))
        .stdout(predicate::str::contains("Inserted: name"))
        .stdout(predicate::str::contains("Location: unchanged"));
}

#[test]
fn apply_json_reports_dropped_and_rejected() {
    let ws = workspace();
    let output = urlfilter(&ws)
        .args(["apply", "--json", "-d"])
        .arg(&ws.definition)
        .arg(
            "genericFilterConfiguration=adults\
             &genericFilterCondition=property:age|ge|21\
             &genericFilterCondition=property:name|eq|Ann\
             &genericFilterCondition=property:address.city|eq|Rome\
             &genericFilterCondition=property:version|eq|2",
        )
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["update"]["configuration"], "adults");
    assert_eq!(json["update"]["report"]["updated"][0], "age");
    assert_eq!(json["update"]["report"]["dropped"][0], "name");
    assert_eq!(json["update"]["report"]["rejected"][0], "address.city");
    assert_eq!(json["update"]["report"]["rejected"][1], "version");
    assert_eq!(
        json["configuration"]["entries"][0]["condition"]["value"]["value"],
        21
    );
}

#[test]
fn apply_echoes_normalized_location() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["apply", "-c", "mine", "-d"])
        .arg(&ws.definition)
        .arg("page=3&genericFilterCondition=property:age|gt|30&genericFilterConfiguration=")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration: mine"))
        .stdout(predicate::str::contains(
            "Location: genericFilterCondition=property%3Aage%7Cgt%7C30&genericFilterConfiguration=mine&page=3",
        ));
}

#[test]
fn decode_reports_dropped_tokens() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["decode", "-d"])
        .arg(&ws.definition)
        .args(["property:age|lt|40", "property:broken", "jpql:x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("age lt 40"))
        .stdout(predicate::str::contains("dropped property:broken"))
        .stdout(predicate::str::contains("Unknown condition type: jpql:x"));
}

#[test]
fn config_honors_file_and_environment() {
    let ws = workspace();
    fs::write(
        ws.dir.path().join("urlfilter.toml"),
        "configuration_param = \"cfg\"\n",
    )
    .unwrap();

    urlfilter(&ws)
        .env("URLFILTER_CONDITION_PARAM", "q")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration_param = \"cfg\""))
        .stdout(predicate::str::contains("condition_param = \"q\""));
}

#[test]
fn custom_condition_param_is_used_for_apply() {
    let ws = workspace();
    let config = ws.dir.path().join("custom.toml");
    fs::write(&config, "condition_param = \"f\"\n").unwrap();

    urlfilter(&ws)
        .arg("--config")
        .arg(&config)
        .args(["apply", "-c", "mine", "-d"])
        .arg(&ws.definition)
        .arg("f=property:name|startsWith|Jo")
        .assert()
        .success()
        .stdout(predicate::str::contains("name startsWith \"Jo\""));
}

#[test]
fn missing_definition_fails() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["encode", "-d", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn unknown_configuration_fails() {
    let ws = workspace();
    urlfilter(&ws)
        .args(["encode", "-c", "ghost", "-d"])
        .arg(&ws.definition)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration: ghost"));
}
