// End-to-end tests of the `mango` binary: exit codes, stdout contract,
// written artifacts. A mock server stands in for the graph store.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn mango() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mango"));
    cmd.env_remove("MANGO_PASSWORD").env_remove("MANGO_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn write_rules(dir: &Path, url: &str, password: Option<&str>) -> PathBuf {
    let password = password.map(|p| format!("password = \"{p}\"\n")).unwrap_or_default();
    let rules = format!(
        r#"name = "fruit"

[server]
url = "{url}"
user = "importer"
{password}
[mapping]
fruit = "Fruit"
color = "Color"

[[relations]]
name = "hasColor"
entity1 = "fruit"
entity2 = "color"

[delimited_fields]
color = ","
"#
    );
    let path = dir.join("fruit.toml");
    std::fs::write(&path, rules).unwrap();
    path
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Store with both types, three existing entities and one existing relation.
fn mock_store(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/users/authenticate");
        then.status(200).json_body(json!({ "jwtToken": "jwt" }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/entity/get")
            .query_param("collectionName", "types")
            .query_param("active", "true");
        then.status(200).json_body(json!({ "result": [
            { "name": "fruit", "displayName": "Fruit" },
            { "name": "color", "displayName": "Color" }
        ]}));
    });
    for (type_name, id) in [("fruit", "t-fruit"), ("color", "t-color")] {
        server.mock(|when, then| {
            when.method(GET)
                .path("/entity/get")
                .query_param("collectionName", "types")
                .query_param("name", type_name);
            then.status(200).json_body(json!({ "result": [{ "_id": id, "name": type_name }] }));
        });
    }
    for (collection, value) in [("fruit", "apple"), ("fruit", "pear"), ("color", "red"), ("color", "green")] {
        server.mock(|when, then| {
            when.method(GET)
                .path("/entity/get")
                .query_param("collectionName", collection)
                .query_param("description", value);
            then.status(200).json_body(json!({ "result": [{ "_id": format!("e-{value}"), "description": value }] }));
        });
    }
    server.mock(|when, then| {
        when.method(GET).path("/relation/getActiveRelationTypes");
        then.status(200).json_body(json!({ "result": [] }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/relation/get");
        then.status(200).json_body(json!({ "result": [
            { "_id": "r-old", "entity1": "e-apple", "entity2": "e-red", "relationType": "rt-1" }
        ]}));
    });
}

// ===========================================================================
// mango import
// ===========================================================================

#[test]
fn import_links_existing_entities_and_writes_artifacts() {
    let server = MockServer::start();
    mock_store(&server);
    let entity_create = server.mock(|when, then| {
        when.method(POST).path("/entity/create");
        then.status(200).json_body(json!({ "_id": "unexpected" }));
    });
    let type_create = server.mock(|when, then| {
        when.method(POST)
            .path("/relation/createRelationType")
            .header("Authorization", "Bearer jwt")
            .json_body(json!({ "value": {
                "active": true, "name": "hasColor", "type": "t-fruit", "relationType": "t-color"
            }}));
        then.status(200).json_body(json!({ "_id": "rt-1" }));
    });
    let relation_create = server.mock(|when, then| {
        when.method(POST).path("/relation/create").json_body(json!({ "value": {
            "active": true, "entity1": "e-apple", "entity2": "e-green", "relationType": "rt-1"
        }}));
        then.status(200).json_body(json!({ "_id": "r-new" }));
    });

    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), &server.base_url(), Some("pw"));
    let out = dir.path().join("out");

    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--rules"])
        .arg(&rules)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    entity_create.assert_calls(0);
    type_create.assert_calls(1);
    relation_create.assert_calls(1);

    let entities = read_json(&out.join("entities.json"));
    assert_eq!(entities["fruit"], json!({ "apple": "e-apple", "pear": "e-pear" }));
    assert_eq!(entities["color"], json!({ "red": "e-red", "green": "e-green" }));

    let relations = read_json(&out.join("relations.json"));
    assert_eq!(relations, json!({ "hasColor": { "fruit": ["r-old", "r-new"] } }));

    let summary = read_json(&out.join("summary.json"));
    assert_eq!(summary["meta"]["rules_name"], "fruit");
    assert_eq!(summary["meta"]["input_blake3"].as_str().unwrap().len(), 64);
    assert_eq!(summary["summary"]["relations_created"], 1);
    assert_eq!(summary["summary"]["relations_matched"], 1);
    assert_eq!(summary["summary"]["rows_skipped"]["hasColor"], 1);
}

#[test]
fn import_password_from_env() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/users/authenticate")
            .json_body(json!({ "username": "importer", "password": "from-env" }));
        then.status(400).json_body(json!({ "message": "nope" }));
    });

    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), &server.base_url(), None);

    let output = mango()
        .env("MANGO_PASSWORD", "from-env")
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    login.assert();
    assert_eq!(code(&output), 10, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn import_without_password_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", None);

    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("no password"), "{}", stderr(&output));
}

#[test]
fn import_unknown_entity_type_exits_11() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/users/authenticate");
        then.status(200).json_body(json!({ "jwtToken": "jwt" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/entity/get").query_param("collectionName", "types");
        then.status(200).json_body(json!({ "result": [{ "name": "fruit", "displayName": "Fruit" }] }));
    });

    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), &server.base_url(), Some("pw"));
    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--rules"])
        .arg(&rules)
        .arg("--output")
        .arg(dir.path().join("out"))
        .output()
        .unwrap();

    assert_eq!(code(&output), 11, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("'Color'"));
    assert!(!dir.path().join("out").exists(), "artifacts are written only after a complete run");
}

#[test]
fn import_unreachable_server_exits_14() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", Some("pw"));

    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(code(&output), 14, "stderr: {}", stderr(&output));
}

#[test]
fn import_dry_run_prints_report_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", None);
    let out = dir.path().join("out");

    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--dry-run", "--json", "--rules"])
        .arg(&rules)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(!out.exists());

    let report: Value = serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(report["relations"]["hasColor"]["fruit"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"]["entities_created"], 4);
    assert_eq!(report["summary"]["columns"]["color"]["merged"], 2);
}

#[test]
fn import_missing_column_exits_16() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", None);
    let data = dir.path().join("fruit.csv");
    std::fs::write(&data, "fruit,shade\napple,red\n").unwrap();

    let output = mango()
        .args(["import", data.to_str().unwrap(), "--dry-run", "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(code(&output), 16);
    assert!(stderr(&output).contains("'color'"));
}

#[test]
fn import_unsupported_format_exits_16() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", None);
    let data = dir.path().join("fruit.parquet");
    std::fs::write(&data, "x").unwrap();

    let output = mango()
        .args(["import", data.to_str().unwrap(), "--dry-run", "--rules"])
        .arg(&rules)
        .output()
        .unwrap();
    assert_eq!(code(&output), 16);
}

#[test]
fn import_bad_delimiter_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://127.0.0.1:9", None);

    let output = mango()
        .args(["import", fixture("fruit.csv").to_str().unwrap(), "--dry-run", "--delimiter", ";;", "--rules"])
        .arg(&rules)
        .output()
        .unwrap();
    assert_eq!(code(&output), 2);
}

// ===========================================================================
// mango validate
// ===========================================================================

#[test]
fn validate_json_describes_rules() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://localhost/api", None);

    let output = mango().args(["validate", "--json"]).arg(&rules).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let val: Value = serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["valid"], true);
    assert_eq!(val["columns"]["color"], "Color");
    assert_eq!(val["relations"], json!(["hasColor"]));
}

#[test]
fn validate_invalid_rules_exits_15() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "http://localhost/api", None);
    let text = std::fs::read_to_string(&rules).unwrap().replace("entity2 = \"color\"", "entity2 = \"shape\"");
    std::fs::write(&rules, text).unwrap();

    let output = mango().arg("validate").arg(&rules).output().unwrap();
    assert_eq!(code(&output), 15);
    assert!(stderr(&output).contains("'shape'"));
}

#[test]
fn validate_missing_file_is_usage_error() {
    let output = mango().args(["validate", "/nonexistent/rules.toml"]).output().unwrap();
    assert_eq!(code(&output), 2);
}

// ===========================================================================
// mango update
// ===========================================================================

#[test]
fn update_overwrites_existing_entity() {
    let server = MockServer::start();
    mock_store(&server);
    let update = server.mock(|when, then| {
        when.method(POST).path("/entity/update").json_body(json!({
            "collectionName": "fruit",
            "id": "e-apple",
            "value": { "description": "apple", "origin": "Chile" }
        }));
        then.status(200).json_body(json!({ "ok": 1 }));
    });

    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), &server.base_url(), Some("pw"));
    let output = mango()
        .args(["update", "--entity-type", "Fruit", "--key", "apple", "--set", "origin=Chile", "--json", "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    update.assert();
    let val: Value = serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["ok"], 1);
}

#[test]
fn update_missing_entity_exits_13() {
    let server = MockServer::start();
    mock_store(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path("/entity/get")
            .query_param("collectionName", "fruit")
            .query_param("description", "durian");
        then.status(200).json_body(json!({ "result": [] }));
    });

    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), &server.base_url(), Some("pw"));
    let output = mango()
        .args(["update", "--entity-type", "Fruit", "--key", "durian", "--set", "origin=Thailand", "--rules"])
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(code(&output), 13, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("durian"));
}
