//! End-to-end tests for `path` and `use`: virtual to physical resolution and
//! the CWD-first current node.

mod common;
use common::prelude::*;

/// `PLATFORM` with its repositories stored under `repos/`, so the workspace
/// root itself is outside the repos directory.
fn separate_store() -> String {
    format!("repos_dir: repos\n{}", configs::PLATFORM)
}

fn stdout_line(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_path_maps_virtual_path_to_directory() {
    let fixture = TestFixture::new().with_config(configs::PLATFORM);
    let expected = fixture
        .path()
        .canonicalize()
        .unwrap()
        .join("platform")
        .join("payments");

    let output = fixture
        .repotree()
        .args(["path", "/platform/payments"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_line(&output), expected.display().to_string());
    // Resolving without --ensure never creates the directory.
    assert!(!expected.exists());
}

#[test]
fn test_path_honors_repos_dir_setting() {
    let fixture = TestFixture::new().with_config(&separate_store());
    let expected = fixture
        .path()
        .canonicalize()
        .unwrap()
        .join("repos")
        .join("tools");

    let output = fixture.repotree().args(["path", "/tools"]).output().unwrap();
    assert_eq!(stdout_line(&output), expected.display().to_string());
}

#[test]
fn test_path_repos_dir_override() {
    let fixture = TestFixture::new()
        .with_config(configs::PLATFORM)
        .with_dir("elsewhere");
    let expected = fixture
        .path()
        .canonicalize()
        .unwrap()
        .join("elsewhere")
        .join("tools");

    let output = fixture
        .repotree()
        .args(["--repos-dir", "elsewhere", "path", "/tools"])
        .output()
        .unwrap();
    assert_eq!(stdout_line(&output), expected.display().to_string());
}

#[test]
fn test_path_virtual_from_inside_node_directory() {
    let fixture = TestFixture::new()
        .with_config(configs::PLATFORM)
        .with_dir("platform/payments/.git")
        .with_dir("platform/payments/src/deep");

    fixture
        .repotree_in(&fixture.path().join("platform/payments/src/deep"))
        .args(["path", "--virtual"])
        .assert()
        .success()
        .stdout("/platform/payments\n");
}

#[test]
fn test_path_to_target_moves_position() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["path", "/platform/ledger"])
        .assert()
        .success();

    fixture
        .repotree()
        .arg("use")
        .assert()
        .success()
        .stdout("/platform/ledger\n");
}

#[test]
fn test_path_to_unknown_target_keeps_position() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["use", "/tools"])
        .assert()
        .success();
    fixture
        .repotree()
        .args(["path", "/platform/nothing"])
        .assert()
        .failure();

    fixture
        .repotree()
        .arg("use")
        .assert()
        .success()
        .stdout("/tools\n");
}

#[test]
fn test_relative_target_resolves_from_working_directory() {
    let fixture = TestFixture::new()
        .with_config(configs::PLATFORM)
        .with_dir("platform");

    fixture
        .repotree_in(&fixture.path().join("platform"))
        .args(["list", "ledger"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ledger (lazy)"));
}

#[test]
fn test_unknown_node_suggests_similar_name() {
    let fixture = TestFixture::new().with_config(configs::PLATFORM);

    fixture
        .repotree()
        .args(["path", "/platform/paymnts"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Node not found: 'paymnts'"))
        .stderr(predicate::str::contains("Did you mean 'payments'?"));
}

#[test]
fn test_use_sets_and_reports_position() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["use", "/platform/ledger"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Now at /platform/ledger"));

    fixture
        .repotree()
        .arg("use")
        .assert()
        .success()
        .stdout("/platform/ledger\n");

    // Commands without a target default to the stored position.
    fixture
        .repotree()
        .args(["path", "--virtual"])
        .assert()
        .success()
        .stdout("/platform/ledger\n");
}

#[test]
fn test_use_relative_to_stored_position() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["use", "/platform/ledger"])
        .assert()
        .success();
    fixture
        .repotree()
        .args(["use", "../payments"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Now at /platform/payments"));
}

#[test]
fn test_working_directory_wins_over_stored_position() {
    let fixture = TestFixture::new()
        .with_config(&separate_store())
        .with_dir("repos/tools");

    fixture
        .repotree()
        .args(["use", "/platform/ledger"])
        .assert()
        .success();

    fixture
        .repotree_in(&fixture.path().join("repos/tools"))
        .arg("use")
        .assert()
        .success()
        .stdout(predicate::str::contains("/tools"))
        .stdout(predicate::str::contains("(stored position: /platform/ledger)"));
}

#[test]
fn test_use_clear() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["use", "/tools"])
        .assert()
        .success();
    fixture
        .repotree()
        .args(["use", "--clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Position cleared"));
    fixture
        .repotree()
        .arg("use")
        .assert()
        .success()
        .stdout("/\n");
}

#[test]
fn test_stale_position_falls_back_to_root() {
    let fixture = TestFixture::new()
        .with_config(&separate_store())
        .with_file(".repotree.state.yaml", "position: /gone/away\n");

    fixture
        .repotree()
        .arg("use")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/\n"))
        .stderr(predicate::str::contains("no longer exists"));
}

#[test]
fn test_use_rejects_unknown_node() {
    let fixture = TestFixture::new().with_config(&separate_store());

    fixture
        .repotree()
        .args(["use", "/nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Node not found"));
    assert!(!fixture.path().join(".repotree.state.yaml").exists());
}
