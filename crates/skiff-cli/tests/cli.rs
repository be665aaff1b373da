//! End-to-end tests of the `skiff` binary

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &str = r#"
name = "api"
main = "src/index.js"
account_id = "acct"
compatibility_date = "2022-03-01"
"#;

fn project(manifest: &str, entry: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("skiff.toml"), manifest).unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/index.js"), entry).unwrap();
    dir
}

fn skiff(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("skiff");
    cmd.current_dir(dir)
        .env("SKIFF_CONFIG", dir.join("no-such-config.toml"))
        .env("SKIFF_API_TOKEN", "test-token")
        .env("SKIFF_ENDPOINT", "http://127.0.0.1:9")
        .env_remove("SKIFF_ACCOUNT_ID")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_publish() {
    cargo_bin_cmd!("skiff")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"));
}

#[test]
fn missing_project_file() {
    let dir = tempfile::tempdir().unwrap();
    skiff(dir.path())
        .arg("publish")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not find skiff.toml"));
}

#[test]
fn missing_compatibility_date_suggests_one() {
    let dir = project(
        "name = \"api\"\nmain = \"src/index.js\"\naccount_id = \"acct\"\n",
        "export default {}",
    );
    skiff(dir.path())
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("compatibility date is required"))
        .stderr(predicate::str::contains("compatibility_date = \""));
}

#[test]
fn legacy_blobs_rejected_for_modules() {
    let manifest = format!("{}\n[text_blobs]\nTEMPLATE = \"template.html\"\n", PROJECT);
    let dir = project(&manifest, "export default { fetch() {} }");
    skiff(dir.path())
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("only supported by the service-worker format"));
}

#[test]
fn unknown_environment() {
    let dir = project(PROJECT, "export default {}");
    skiff(dir.path())
        .args(["publish", "--env", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No [env.prod] section"));
}

#[test]
fn missing_token() {
    let dir = project(PROJECT, "export default {}");
    skiff(dir.path())
        .env_remove("SKIFF_API_TOKEN")
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API token configured"));
}

#[test]
fn unreachable_registry_is_an_upload_failure() {
    let dir = project(PROJECT, "export default {}");
    skiff(dir.path())
        .args(["publish", "--no-workers-dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to upload api"))
        .stderr(predicate::str::contains("previously published version is still live"));
}

#[test]
fn config_redacts_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_token = \"super-secret\"\naccount_id = \"acct\"\n").unwrap();

    skiff(dir.path())
        .env("SKIFF_CONFIG", &path)
        .args(["--output", "json", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("super-secret").not());
}
