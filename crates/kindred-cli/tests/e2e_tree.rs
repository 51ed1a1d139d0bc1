//! End-to-end workflows for `kin`: init, add/connect with rejections,
//! layout, export/import round trips and reset.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn kin_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kin"));
    cmd.current_dir(dir);
    cmd.env("KINDRED_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".user-config"));
    cmd.env_remove("FORMAT");
    cmd
}

fn kin_human_cmd(dir: &Path) -> Command {
    let mut cmd = kin_cmd(dir);
    cmd.env("FORMAT", "pretty");
    cmd
}

fn init_project(dir: &Path) {
    kin_cmd(dir).args(["init"]).assert().success();
}

fn kin_json(dir: &Path, args: &[&str]) -> Value {
    let output = kin_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("kin should not crash");
    assert!(
        output.status.success(),
        "kin {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn kin_json_err(dir: &Path, args: &[&str]) -> Value {
    let output = kin_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("kin should not crash");
    assert!(!output.status.success(), "kin {args:?} unexpectedly succeeded");
    serde_json::from_slice(&output.stderr).expect("error JSON on stderr")
}

fn add_person(dir: &Path, name: &str, extra: &[&str]) -> String {
    let mut args = vec!["add", "--goes-by", name];
    args.extend_from_slice(extra);
    let json = kin_json(dir, &args);
    json["person"]["id"].as_str().expect("id must exist").to_string()
}

fn stored_tree(dir: &Path) -> Value {
    let text = std::fs::read_to_string(dir.join(".kindred/tree.json")).expect("tree.json exists");
    serde_json::from_str(&text).expect("tree.json is JSON")
}

#[test]
fn commands_outside_a_project_explain_how_to_start() {
    let dir = TempDir::new().expect("tempdir");
    let err = kin_json_err(dir.path(), &["list"]);
    assert_eq!(err["error"]["error_code"], "E1001");
    assert!(
        err["error"]["suggestion"]
            .as_str()
            .expect("suggestion")
            .contains("kin init")
    );
}

#[test]
fn init_seeds_the_sample_family() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let list = kin_json(dir.path(), &["list"]);
    let names: Vec<&str> = list
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["John", "Sarah", "Mike"]);

    let tree = stored_tree(dir.path());
    assert_eq!(tree["version"], 1);
    assert!(tree["contentHash"].as_str().expect("hash").starts_with("blake3:"));
}

#[test]
fn init_twice_requires_force() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    kin_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    kin_cmd(dir.path())
        .args(["init", "--force", "--empty"])
        .assert()
        .success();
    let list = kin_json(dir.path(), &["list"]);
    assert_eq!(list.as_array().map(Vec::len), Some(0));
}

#[test]
fn add_with_parent_and_show_roles() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let emma = add_person(dir.path(), "Emma", &["--last-name", "Smith", "--parent", "2"]);
    let show = kin_json(dir.path(), &["show", &emma]);
    assert_eq!(show["person"]["data"]["lastName"], "Smith");
    let connections = show["connections"].as_array().expect("connections");
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["other"], "2");
    assert_eq!(connections[0]["role"], "parent");
    assert_eq!(connections[0]["name"], "Sarah");

    let ancestors: Vec<&str> = show["ancestors"]
        .as_array()
        .expect("ancestors")
        .iter()
        .map(|a| a.as_str().expect("id"))
        .collect();
    assert_eq!(ancestors, vec!["2", "1"]);
}

#[test]
fn blank_name_is_rejected_and_nothing_changes() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let before = stored_tree(dir.path());

    let err = kin_json_err(dir.path(), &["add", "--goes-by", "   "]);
    assert_eq!(err["error"]["error_code"], "E2001");
    assert_eq!(stored_tree(dir.path()), before);
}

#[test]
fn cycle_is_refused_with_path() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let emma = add_person(dir.path(), "Emma", &["--parent", "2"]);
    let err = kin_json_err(dir.path(), &["connect", &emma, "1"]);
    assert_eq!(err["error"]["error_code"], "E2005");
    let message = err["error"]["message"].as_str().expect("message");
    assert!(message.contains("1 → 2"), "message: {message}");
}

#[test]
fn duplicate_and_self_links_are_refused() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let err = kin_json_err(dir.path(), &["connect", "1", "2"]);
    assert_eq!(err["error"]["error_code"], "E2004");

    let err = kin_json_err(dir.path(), &["connect", "3", "3", "--kind", "spouse"]);
    assert_eq!(err["error"]["error_code"], "E2003");

    let err = kin_json_err(dir.path(), &["connect", "1", "nobody"]);
    assert_eq!(err["error"]["error_code"], "E2002");
}

#[test]
fn spouse_links_ignore_direction_for_duplicates() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let linda = add_person(dir.path(), "Linda", &["--spouse", "1"]);
    let err = kin_json_err(dir.path(), &["connect", "1", &linda, "--kind", "spouse"]);
    assert_eq!(err["error"]["error_code"], "E2004");

    let candidates = kin_json(dir.path(), &["candidates", "1", "--kind", "spouse"]);
    let ids: Vec<&str> = candidates
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["2", "3"]);

    let candidates = kin_json(dir.path(), &["candidates", "1", "--kind", "parent-child"]);
    assert_eq!(candidates.as_array().map(Vec::len), Some(0));
}

#[test]
fn partial_add_keeps_person_unless_atomic() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    // The second link would make person 1 both parent and child of Kid.
    let err = kin_json_err(
        dir.path(),
        &["add", "--goes-by", "Kid", "--parent", "1", "--child", "1"],
    );
    assert_eq!(err["error"]["error_code"], "E2005");
    let tree = stored_tree(dir.path());
    assert_eq!(tree["persons"].as_array().map(Vec::len), Some(4));
    assert_eq!(tree["relationships"].as_array().map(Vec::len), Some(3));

    let err = kin_json_err(
        dir.path(),
        &["add", "--goes-by", "Other", "--parent", "1", "--child", "1", "--atomic"],
    );
    assert!(
        err["error"]["message"]
            .as_str()
            .expect("message")
            .contains("rolled back")
    );
    let tree = stored_tree(dir.path());
    assert_eq!(tree["persons"].as_array().map(Vec::len), Some(4));
}

#[test]
fn remove_cascades_relationships() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let out = kin_json(dir.path(), &["remove", "1"]);
    assert_eq!(out["removed"]["id"], "1");
    assert_eq!(out["relationships_removed"], 2);

    let tree = stored_tree(dir.path());
    assert_eq!(tree["relationships"].as_array().map(Vec::len), Some(0));

    let out = kin_json(dir.path(), &["remove", "1"]);
    assert!(out["removed"].is_null());
}

#[test]
fn disconnect_then_reconnect() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let out = kin_json(dir.path(), &["disconnect", "e1-2"]);
    assert_eq!(out["removed"]["id"], "e1-2");
    let out = kin_json(dir.path(), &["disconnect", "e1-2"]);
    assert!(out["removed"].is_null());

    let rel = kin_json(dir.path(), &["connect", "1", "2"]);
    assert_eq!(rel["kind"], "parent-child");
    assert_eq!(rel["source"], "1");
}

#[test]
fn layout_places_parent_above_children() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let out = kin_json(dir.path(), &["layout"]);
    assert_eq!(out["saved"], true);
    assert_eq!(out["stats"]["ranks"], 2);

    let show = kin_json(dir.path(), &["show", "1"]);
    assert_eq!(show["person"]["position"]["x"], 150.0);
    assert_eq!(show["person"]["position"]["y"], 0.0);
    let show = kin_json(dir.path(), &["show", "3"]);
    assert_eq!(show["person"]["position"]["y"], 220.0);
}

#[test]
fn layout_dry_run_does_not_save() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let before = stored_tree(dir.path());

    let out = kin_json(dir.path(), &["layout", "--direction", "left-right", "--dry-run"]);
    assert_eq!(out["saved"], false);
    assert_eq!(out["direction"], "left-right");
    assert_eq!(stored_tree(dir.path()), before);
}

#[test]
fn auto_layout_runs_after_connect() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    std::fs::write(
        dir.path().join(".kindred/config.toml"),
        "[graph]\nauto_layout = true\n",
    )
    .expect("write config");

    let linda = add_person(dir.path(), "Linda", &["--spouse", "1"]);
    let john = kin_json(dir.path(), &["show", "1"]);
    let wife = kin_json(dir.path(), &["show", &linda]);
    assert_eq!(john["person"]["position"]["y"], wife["person"]["position"]["y"]);
}

#[test]
fn move_sets_position() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    kin_json(dir.path(), &["move", "3", "-40", "12.5"]);
    let show = kin_json(dir.path(), &["show", "3"]);
    assert_eq!(show["person"]["position"]["x"], -40.0);
    assert_eq!(show["person"]["position"]["y"], 12.5);
}

#[test]
fn move_rejects_non_finite_coordinates() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let before = stored_tree(dir.path());

    for (x, y) in [("NaN", "0"), ("0", "inf")] {
        let err = kin_json_err(dir.path(), &["move", "3", x, y]);
        assert_eq!(err["error"]["error_code"], "E2007");
    }
    assert_eq!(stored_tree(dir.path()), before);

    let show = kin_json(dir.path(), &["show", "3"]);
    assert_eq!(show["person"]["position"]["x"], 400.0);
}

#[test]
fn import_recovers_a_corrupt_tree() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let export = dir.path().join("family.json");
    kin_json(dir.path(), &["export", "--output", export.to_str().expect("utf8 path")]);

    let path = dir.path().join(".kindred/tree.json");
    std::fs::write(&path, "{ not json").expect("corrupt tree");
    let err = kin_json_err(dir.path(), &["list"]);
    assert_eq!(err["error"]["error_code"], "E4001");

    let out = kin_json(dir.path(), &["import", export.to_str().expect("utf8 path")]);
    assert_eq!(out["persons"], 3);
    let list = kin_json(dir.path(), &["list"]);
    assert_eq!(list.as_array().map(Vec::len), Some(3));
}

#[test]
fn invalid_layout_geometry_is_a_config_error() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    std::fs::write(
        dir.path().join(".kindred/config.toml"),
        "[layout]\nnode_sep = nan\n\n[graph]\nauto_layout = true\n",
    )
    .expect("write config");

    let err = kin_json_err(dir.path(), &["layout"]);
    assert_eq!(err["error"]["error_code"], "E1002");
    assert!(
        err["error"]["message"]
            .as_str()
            .expect("message")
            .contains("node_sep"),
        "message: {err}"
    );
}

#[test]
fn export_import_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    add_person(dir.path(), "Emma", &["--parent", "2"]);

    let export = dir.path().join("family.json");
    kin_json(dir.path(), &["export", "--output", export.to_str().expect("utf8 path")]);

    kin_cmd(dir.path()).args(["reset", "--empty"]).assert().success();
    let list = kin_json(dir.path(), &["list"]);
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    let out = kin_json(dir.path(), &["import", export.to_str().expect("utf8 path")]);
    assert_eq!(out["persons"], 4);
    assert_eq!(out["relationships"], 3);
}

#[test]
fn import_understands_legacy_browser_export() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let legacy = r#"{
        "nodes": [
            {"id": "a", "type": "personNode", "position": {"x": 0, "y": 0}, "data": {"goesBy": "Ann"}},
            {"id": "b", "type": "personNode", "position": {"x": 10, "y": 10}, "data": {"goesBy": "Bob"}},
            {"id": "c", "type": "personNode", "position": {"x": 20, "y": 20}, "data": {"goesBy": "Cat"}}
        ],
        "edges": [
            {"id": "ab", "source": "a", "target": "b", "data": {"type": "spouse"}},
            {"id": "ac", "source": "a", "target": "c"}
        ],
        "lastUpdated": "2024-01-01T00:00:00.000Z"
    }"#;
    let file = dir.path().join("legacy.json");
    std::fs::write(&file, legacy).expect("write legacy");

    kin_json(dir.path(), &["import", file.to_str().expect("utf8 path")]);
    let show = kin_json(dir.path(), &["show", "a"]);
    let roles: Vec<&str> = show["connections"]
        .as_array()
        .expect("connections")
        .iter()
        .map(|c| c["role"].as_str().expect("role"))
        .collect();
    assert_eq!(roles, vec!["spouse", "child"]);
}

#[test]
fn import_rejects_cyclic_document_and_keeps_tree() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let before = stored_tree(dir.path());

    let cyclic = r#"{
        "persons": [
            {"id": "a", "data": {"goesBy": "A"}},
            {"id": "b", "data": {"goesBy": "B"}}
        ],
        "relationships": [
            {"id": "r1", "source": "a", "target": "b", "kind": "parent-child"},
            {"id": "r2", "source": "b", "target": "a", "kind": "parent-child"}
        ]
    }"#;
    let file = dir.path().join("cyclic.json");
    std::fs::write(&file, cyclic).expect("write");

    let err = kin_json_err(dir.path(), &["import", file.to_str().expect("utf8 path")]);
    assert_eq!(err["error"]["error_code"], "E2005");
    assert_eq!(stored_tree(dir.path()), before);
}

#[test]
fn check_detects_tampering() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let out = kin_json(dir.path(), &["check"]);
    assert_eq!(out["ok"], true);

    let path = dir.path().join(".kindred/tree.json");
    let text = std::fs::read_to_string(&path).expect("read");
    std::fs::write(&path, text.replace("Family patriarch", "Edited by hand")).expect("write");

    kin_cmd(dir.path())
        .args(["check", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E4001"));
}

#[test]
fn reset_restores_the_sample_family() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    kin_json(dir.path(), &["remove", "3"]);

    kin_json(dir.path(), &["reset"]);
    let list = kin_json(dir.path(), &["list"]);
    assert_eq!(list.as_array().map(Vec::len), Some(3));
}

#[test]
fn human_output_shows_sections() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    kin_human_cmd(dir.path())
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("John [1]"))
        .stdout(predicate::str::contains("Relationships"))
        .stdout(predicate::str::contains("Family patriarch"));
}

#[test]
fn text_output_is_tab_separated() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    kin_cmd(dir.path())
        .args(["show", "1", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1\tJohn\n"))
        .stdout(predicate::str::contains("child\t2\tSarah\te1-2"));
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kin"));
}
