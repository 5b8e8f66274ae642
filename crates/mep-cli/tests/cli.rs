use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

/// `mep` with an isolated home so no user config leaks in.
fn mep(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mep").unwrap();
    cmd.env("MEP_HOME", home).env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn wire_check_continuous_boundary_passes() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["wire", "check", "10 AWG", "--amps", "24", "--continuous"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Result    : OK"));
}

#[test]
fn wire_check_suggests_larger_gauge() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["wire", "check", "10 AWG", "--amps", "31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UNDERSIZED").and(predicate::str::contains("8 AWG")));
}

#[test]
fn wire_check_rejects_unknown_gauge() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["wire", "check", "13 AWG", "--amps", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown wire size"));
}

#[test]
fn wire_min_beyond_table_returns_largest() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["wire", "min", "480"])
        .assert()
        .success()
        .stdout(predicate::str::contains("750 kcmil").and(predicate::str::contains("parallel")));
}

#[test]
fn wire_table_lists_every_gauge() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["wire", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("14 AWG").and(predicate::str::contains("750 kcmil")));
}

#[test]
fn conduit_fill_overfilled_suggests_next_size() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["conduit", "fill", "1/2\"", "--wire", "3x10AWG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OVERFILLED").and(predicate::str::contains("3/4\" conduit")));
}

#[test]
fn conduit_fill_json_output() {
    let home = tempdir().unwrap();
    let output = mep(home.path())
        .args([
            "conduit", "fill", "1", "--wire", "3x10 AWG", "--wire", "10 AWG", "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["valid"], true);
    assert_eq!(json["conductorCount"], 4);
    assert_eq!(json["maxFillPercentage"], 40.0);
    assert_eq!(json["conduitSize"], "1\"");
}

#[test]
fn hierarchy_validate_reports_step_up() {
    let home = tempdir().unwrap();
    let input = repo_path("test_data/hierarchy/step_up.json");
    mep(home.path())
        .args(["hierarchy", "validate", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("voltage_step_up")
                .and(predicate::str::contains("panel-b"))
                .and(predicate::str::contains("1 error")),
        );

    mep(home.path())
        .args(["hierarchy", "validate", "--strict", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 error-severity issue"));
}

#[test]
fn hierarchy_validate_clean_json() {
    let home = tempdir().unwrap();
    let input = repo_path("test_data/hierarchy/clean.json");
    let output = mep(home.path())
        .args(["hierarchy", "validate", input.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["canSave"], true);
    assert_eq!(json["summary"], "No issues");
    assert_eq!(json["equipment"], 3);
    assert_eq!(json["maxDepth"], 2);
}

#[test]
fn hierarchy_validate_derives_levels_from_parent_links() {
    let home = tempdir().unwrap();
    let input = repo_path("test_data/hierarchy/no_levels.json");
    let output = mep(home.path())
        .args(["hierarchy", "validate", input.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["maxDepth"], 1);
    assert_eq!(json["canSave"], true);
    let info = json["report"]["info"].as_array().unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0]["equipmentId"], "lp-2");
    assert_eq!(info[0]["type"], "missing_service_disconnect");
}

#[test]
fn hierarchy_graph_tree_and_dot() {
    let home = tempdir().unwrap();
    let input = repo_path("test_data/hierarchy/clean.json");
    mep(home.path())
        .args(["hierarchy", "graph", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "sd-1 [service_disconnect]\n  xf-1 [transformer]\n    lp-1 [panel]",
        ));

    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("graphs").join("hierarchy.dot");
    mep(home.path())
        .args([
            "hierarchy",
            "graph",
            input.to_str().unwrap(),
            "--format",
            "dot",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    let dot = fs::read_to_string(&out).unwrap();
    assert!(dot.starts_with("digraph mep_hierarchy {"));
    assert!(dot.contains("n1 -> n2;"));
}

#[test]
fn survey_run_saves_and_show_reads_back() {
    let home = tempdir().unwrap();
    let store = tempdir().unwrap();
    let script = repo_path("test_data/survey/building7.yaml");

    mep(home.path())
        .args([
            "survey",
            "run",
            script.to_str().unwrap(),
            "--store",
            store.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("skipped: Equipment type could not be identified")
                .and(predicate::str::contains("Review: No issues"))
                .and(predicate::str::contains(
                    "Gaps: 3 surveyed, 1 skipped; 1 missing nameplate fields",
                ))
                .and(predicate::str::contains("  xfmr-t1: missing amperage"))
                .and(predicate::str::contains("Saved 3 item(s) to project bldg-7")),
        );
    assert!(store.path().join("bldg-7.json").exists());

    let output = mep(home.path())
        .args([
            "survey",
            "show",
            "bldg-7",
            "--store",
            store.path().to_str().unwrap(),
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let project = stdout_json(&output.stdout);
    assert_eq!(project["name"], "Building 7 electrical survey");
    assert_eq!(project["equipment"].as_array().unwrap().len(), 3);
    assert_eq!(project["equipment"][2]["id"], "lp-1");
    assert_eq!(project["equipment"][2]["hierarchyLevel"], 2);
    assert_eq!(project["equipment"][2]["extractedData"]["amperage"], "225A Main");
    assert_eq!(project["summary"]["byType"]["panel"], 1);

    mep(home.path())
        .args(["survey", "list", "--store", store.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("bldg-7"));
}

#[test]
fn default_store_lives_under_mep_home() {
    let home = tempdir().unwrap();
    let script = repo_path("test_data/survey/building7.yaml");
    mep(home.path())
        .args(["survey", "run", script.to_str().unwrap()])
        .assert()
        .success();
    assert!(home.path().join("projects").join("bldg-7.json").exists());

    mep(home.path())
        .args(["survey", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bldg-7"));
}

#[test]
fn survey_run_with_errors_is_not_saved() {
    let home = tempdir().unwrap();
    let store = tempdir().unwrap();
    let script = repo_path("test_data/survey/step_up.json");

    mep(home.path())
        .args([
            "survey",
            "run",
            script.to_str().unwrap(),
            "--store",
            store.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("voltage_step_up"))
        .stderr(predicate::str::contains("Save blocked"));
    assert!(!store.path().join("step-up.json").exists());
}

#[test]
fn survey_dry_run_json() {
    let home = tempdir().unwrap();
    let store = tempdir().unwrap();
    let script = repo_path("test_data/survey/building7.yaml");
    let output = mep(home.path())
        .args([
            "survey",
            "run",
            script.to_str().unwrap(),
            "--store",
            store.path().to_str().unwrap(),
            "--dry-run",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["stage"], "REVIEW");
    assert_eq!(json["canSave"], true);
    assert_eq!(json["items"].as_array().unwrap().len(), 4);
    assert!(json["saved"].is_null());
    assert_eq!(json["gaps"]["skipped"], 1);
    assert_eq!(json["gaps"]["missingFieldCounts"]["amperage"], 1);
    assert!(!store.path().join("bldg-7.json").exists());
}

#[test]
fn config_init_and_show() {
    let home = tempdir().unwrap();
    mep(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(home.path().join("config").join("mep.toml").exists());

    mep(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    mep(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("voltage_tolerance = 1.05")
                .and(predicate::str::contains("store_dir")),
        );
}

#[test]
fn config_tolerance_changes_validation() {
    let home = tempdir().unwrap();
    let config_dir = home.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("mep.toml"),
        "[validation]\nvoltage_tolerance = 1.5\n",
    )
    .unwrap();
    let input = repo_path("test_data/hierarchy/step_up.json");
    mep(home.path())
        .args(["hierarchy", "validate", "--strict", input.to_str().unwrap()])
        .assert()
        .success();
}
