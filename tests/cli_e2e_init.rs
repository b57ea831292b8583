//! End-to-end tests for the `init` command.

mod common;
use common::prelude::*;

#[test]
fn test_init_creates_document() {
    let fixture = TestFixture::new();

    fixture
        .repotree()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    fixture
        .repotree()
        .args(["list", "/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/"));
    assert!(fixture.config_path().exists());
}

#[test]
fn test_init_in_subdirectory_with_seed_repos() {
    let fixture = TestFixture::new();

    fixture
        .repotree()
        .args([
            "init",
            "ws",
            "--store",
            "src",
            "--repo",
            "api=https://example.invalid/acme/api.git",
            "--no-clone",
        ])
        .assert()
        .success();

    let document = fixture.read("ws/.repotree.yaml");
    assert!(document.contains("repos_dir: src"));
    assert!(document.contains("name: api"));
    assert!(document.contains("https://example.invalid/acme/api.git"));
}

#[test]
fn test_init_keeps_existing_document() {
    let fixture = TestFixture::new().with_config(configs::PLATFORM);

    fixture
        .repotree()
        .args(["init", "--no-clone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    assert!(fixture.read(".repotree.yaml").contains("payments"));
}

#[test]
fn test_init_force_replaces_document() {
    let fixture = TestFixture::new().with_config(configs::PLATFORM);

    fixture
        .repotree()
        .args(["init", "--force", "--no-clone"])
        .assert()
        .success();

    assert!(!fixture.read(".repotree.yaml").contains("payments"));
}

#[test]
fn test_init_clones_nothing_without_eager_nodes() {
    let fixture = TestFixture::new();

    fixture
        .repotree()
        .args(["init", "--repo", "api=https://example.invalid/acme/api.git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lazy"));

    assert!(!fixture.path().join("api").exists());
}

#[test]
fn test_init_rejects_malformed_repo_entry() {
    let fixture = TestFixture::new();

    fixture
        .repotree()
        .args(["init", "--repo", "no-separator"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=URL"));
}
