//! Integration tests for the `dt` binary.
//!
//! These tests run the CLI against temporary metastores and check its JSON
//! output and exit status.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A temporary metastore plus an isolated home directory.
struct TestMetastore {
    dir: TempDir,
}

impl TestMetastore {
    fn new() -> Self {
        let ms = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        ms.put(
            "automated",
            "core/nil.element.json",
            json!({ "id": "element:core:nil", "element_type": { "Text": {} } }),
        );
        ms
    }

    fn base(&self) -> std::path::PathBuf {
        self.dir.path().join("metastore")
    }

    fn home(&self) -> std::path::PathBuf {
        self.dir.path().join("home")
    }

    fn put(&self, layer: &str, relative: &str, doc: Value) {
        let path = self.base().join(layer).join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    }

    /// A `dt` command bound to this metastore, ignoring any user config.
    fn dt(&self) -> Command {
        let mut cmd = Command::cargo_bin("dt").unwrap();
        cmd.env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.home().join(".config"))
            .env("DATATHREAD_CONFIG", self.home().join("none.toml"))
            .env_remove("DATATHREAD_LOG")
            .arg("--base-dir")
            .arg(self.base());
        cmd
    }

    /// Run `dt` with the given arguments and parse stdout as JSON.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.dt().args(args).output().expect("run dt");
        assert!(
            output.status.success(),
            "dt {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}

fn write_file(dir: &Path, name: &str, doc: &Value) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(doc).unwrap()).unwrap();
    path
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn help_lists_commands() {
    Command::cargo_bin("dt")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dataset"))
        .stdout(predicate::str::contains("lineage"));
}

#[test]
fn element_is_printed_inflated() {
    let ms = TestMetastore::new();
    ms.put(
        "automated",
        "sales/amount.element.json",
        json!({ "id": "element:sales:amount", "element_type": { "Reference": { "ref": "element:core:money" } } }),
    );
    ms.put(
        "automated",
        "core/money.element.json",
        json!({ "id": "element:core:money", "element_type": { "Number": {} } }),
    );

    let element = ms.json(&["element", "element:sales:amount"]);

    assert_eq!(element["element_type"]["__typename"], "ReferenceType");
    assert_eq!(
        element["element_type"]["Reference"]["ref"]["id"],
        "element:core:money"
    );
    assert_eq!(element["lineage"][1]["__typename"], "NumberType");
}

#[test]
fn missing_element_fails() {
    let ms = TestMetastore::new();
    ms.dt()
        .args(["element", "element:sales:nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_urn_fails() {
    let ms = TestMetastore::new();
    ms.dt()
        .args(["element", "element:only-two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URN"));
}

#[test]
fn dataset_fields_fall_back_to_nil() {
    let ms = TestMetastore::new();
    ms.put(
        "automated",
        "sales/orders.dataset.json",
        json!({ "id": "dataset:sales:orders", "fields": [{ "name": "mystery" }] }),
    );

    let dataset = ms.json(&["dataset", "dataset:sales:orders"]);
    assert_eq!(dataset["fields"][0]["element"]["id"], "element:core:nil");

    let all = ms.json(&["datasets"]);
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[test]
fn base_type_and_lineage() {
    let ms = TestMetastore::new();
    ms.put(
        "edited",
        "d/a.element.json",
        json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b" } } }),
    );
    ms.put(
        "automated",
        "d/b.element.json",
        json!({ "id": "element:d:b", "element_type": { "Enum": { "values": ["x", "y"] } } }),
    );

    let base = ms.json(&["base-type", "element:d:a"]);
    assert_eq!(base["__typename"], "EnumType");

    let lineage = ms.json(&["lineage", "element:d:a"]);
    let names: Vec<&str> = lineage
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["__typename"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ReferenceType", "EnumType"]);
}

#[test]
fn elements_lists_all_layers() {
    let ms = TestMetastore::new();
    ms.put(
        "edited",
        "d/a.element.json",
        json!({ "id": "element:d:a", "element_type": { "Time": {} } }),
    );

    let elements = ms.json(&["elements"]);
    let mut ids: Vec<&str> = elements
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["element:core:nil", "element:d:a"]);
}

#[test]
fn compact_output_is_one_line() {
    let ms = TestMetastore::new();
    ms.dt()
        .args(["--compact", "element", "element:core:nil"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\{.*\}\n$").unwrap());
}

#[test]
fn path_reports_each_layer() {
    let ms = TestMetastore::new();
    let paths = ms.json(&["path", "element:core:nil"]);
    let entries = paths.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["layer"], "automated");
    assert_eq!(entries[0]["exists"], true);
    assert_eq!(entries[1]["layer"], "edited");
    assert_eq!(entries[1]["exists"], false);
    assert!(entries[1]["path"]
        .as_str()
        .unwrap()
        .ends_with("nil.element.json"));
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn write_creates_document_in_edited() {
    let ms = TestMetastore::new();
    let doc = json!({ "id": "element:sales:amount", "element_type": { "Number": {} } });
    let file = write_file(ms.dir.path(), "amount.json", &doc);

    let event = ms.json(&["write", "element", file.to_str().unwrap()]);

    assert_eq!(event, json!({ "Created": doc }));
    assert!(ms
        .base()
        .join("edited/sales/amount.element.json")
        .is_file());
}

#[test]
fn write_from_stdin() {
    let ms = TestMetastore::new();
    let doc = json!({ "id": "dataset:hr:staff", "fields": [] });

    ms.dt()
        .args(["write", "dataset", "-"])
        .write_stdin(serde_json::to_string(&doc).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert!(ms.base().join("edited/hr/staff.dataset.json").is_file());
}

#[test]
fn invalid_write_reports_request_failed() {
    let ms = TestMetastore::new();
    let doc = json!({ "id": "element:d:bad", "element_type": { "Number": {}, "Text": {} } });
    let file = write_file(ms.dir.path(), "bad.json", &doc);

    ms.dt()
        .args(["write", "element", file.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("RequestFailed"));

    assert!(!ms.base().join("edited/d/bad.element.json").exists());
}

// =============================================================================
// Config and completion
// =============================================================================

#[test]
fn config_set_and_get_metastore_values() {
    let ms = TestMetastore::new();

    ms.dt()
        .args(["config", "set", "max_reference_depth", "8"])
        .assert()
        .success();
    ms.dt()
        .args(["config", "get", "max_reference_depth"])
        .assert()
        .success()
        .stdout("8\n");

    assert!(ms.base().join("datathread.toml").is_file());
}

#[test]
fn config_rejects_invalid_values() {
    let ms = TestMetastore::new();
    ms.dt()
        .args(["config", "set", "max_reference_depth", "0"])
        .assert()
        .failure();
    ms.dt()
        .args(["config", "set", "layers", "a,../b"])
        .assert()
        .failure();
    ms.dt()
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure();
}

#[test]
fn config_list_shows_defaults() {
    let ms = TestMetastore::new();
    ms.dt()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("layers = automated,edited"))
        .stdout(predicate::str::contains("nil_element = element:core:nil"));
}

#[test]
fn custom_layers_from_metastore_config() {
    let ms = TestMetastore::new();
    std::fs::write(
        ms.base().join("datathread.toml"),
        "layers = [\"automated\", \"curated\"]\n",
    )
    .unwrap();
    ms.put(
        "curated",
        "d/a.element.json",
        json!({ "id": "element:d:a", "element_type": { "Date": {} } }),
    );

    let element = ms.json(&["element", "element:d:a"]);
    assert_eq!(element["element_type"]["__typename"], "DateType");
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("dt")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dt"));
}
