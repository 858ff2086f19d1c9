use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const ENV_VARS: &[&str] = &[
    "AMIQUERY_CONFIG",
    "AMIQUERY_FORMAT",
    "AMIQUERY_DEBUG",
    "AMIQUERY_ROLE_NAME",
    "AMIQUERY_OWNER_IDS",
    "AMIQUERY_REGIONS",
    "AMIQUERY_TAG_FILTER",
    "AMIQUERY_STATE_TAG",
    "AMIQUERY_CACHE_TTL",
    "AMIQUERY_CACHE_MAX_CONCURRENT_REQUESTS",
    "AMIQUERY_CACHE_MAX_REQUESTS_PER_SECOND",
    "AMIQUERY_COLLECT_LAUNCH_PERMISSIONS",
    "AMIQUERY_INVENTORY",
    "RUST_LOG",
];

const INVENTORY: &str = r#"
accounts:
  "111111111111":
    us-west-2:
      - imageId: ami-old
        name: base-old
        description: older available image
        virtualizationType: hvm
        creationDate: "2013-10-25T00:00:00.000Z"
        tags:
          - key: state
            value: available
          - key: os
            value: linux
        launchPermissions: ["999999999999"]
      - imageId: ami-dep
        name: base-dep
        creationDate: "2013-10-29T00:00:00.000Z"
        tags:
          - key: state
            value: deprecated
          - key: os
            value: linux
  "222222222222":
    us-east-1:
      - imageId: ami-new
        name: win-new
        creationDate: "2014-01-01T00:00:00.000Z"
        tags:
          - key: state
            value: available
          - key: os
            value: windows
"#;

/// Command with a clean environment and a temporary home directory.
fn ami_query(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ami-query"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home);
    cmd
}

fn write_inventory(dir: &Path) -> PathBuf {
    let path = dir.join("inventory.yaml");
    fs::write(&path, INVENTORY).expect("failed to write inventory");
    path
}

/// Command configured through the environment against the test inventory.
fn configured(temp: &TempDir) -> Command {
    let inventory = write_inventory(temp.path());
    let mut cmd = ami_query(temp.path());
    cmd.env("AMIQUERY_ROLE_NAME", "ami-query")
        .env("AMIQUERY_OWNER_IDS", "111111111111,222222222222")
        .env("AMIQUERY_REGIONS", "us-west-2,us-east-1")
        .env("AMIQUERY_INVENTORY", &inventory);
    cmd
}

fn ids(stdout: &[u8]) -> Vec<String> {
    let value: serde_json::Value = serde_json::from_slice(stdout).expect("stdout is JSON");
    value
        .as_array()
        .expect("stdout is a JSON array")
        .iter()
        .map(|image| image["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn version_prints_package_version() {
    let temp = tempdir().unwrap();
    ami_query(temp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn regions_defaults_to_all() {
    let temp = tempdir().unwrap();
    ami_query(temp.path())
        .arg("regions")
        .assert()
        .success()
        .stdout(predicate::str::contains("us-west-2"))
        .stdout(predicate::str::contains("eu-central-1"));
}

#[test]
fn regions_from_environment_as_table() {
    let temp = tempdir().unwrap();
    ami_query(temp.path())
        .env("AMIQUERY_REGIONS", "us-west-1,us-west-2")
        .args(["regions", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REGION"))
        .stdout(predicate::str::contains("us-west-1"))
        .stdout(predicate::str::contains("eu-central-1").not());
}

#[test]
fn regions_rejects_unknown_region() {
    let temp = tempdir().unwrap();
    ami_query(temp.path())
        .args(["regions", "--regions", "us-bogus-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown or unsupported region: us-bogus-1"));
}

#[test]
fn query_ranks_across_accounts_and_regions() {
    let temp = tempdir().unwrap();
    let assert = configured(&temp).arg("query").assert().success();

    assert_eq!(
        ids(&assert.get_output().stdout),
        vec!["ami-new", "ami-old", "ami-dep"]
    );
}

#[test]
fn query_filters() {
    let temp = tempdir().unwrap();

    let assert = configured(&temp)
        .args(["query", "region=us-west-2&state=deprecated"])
        .assert()
        .success();
    assert_eq!(ids(&assert.get_output().stdout), vec!["ami-dep"]);

    let assert = configured(&temp)
        .args(["query", "tag=os:linux&launch_permission=999999999999"])
        .assert()
        .success();
    assert_eq!(ids(&assert.get_output().stdout), vec!["ami-old"]);

    let assert = configured(&temp)
        .args(["query", "owner_id=222222222222"])
        .assert()
        .success();
    assert_eq!(ids(&assert.get_output().stdout), vec!["ami-new"]);
}

#[test]
fn query_output_shape() {
    let temp = tempdir().unwrap();
    let assert = configured(&temp)
        .args(["query", "ami=ami-old"])
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let image = &value[0];
    assert_eq!(image["region"], "us-west-2");
    assert_eq!(image["name"], "base-old");
    assert_eq!(image["description"], "older available image");
    assert_eq!(image["virtualizationtype"], "hvm");
    assert_eq!(image["creationdate"], "2013-10-25T00:00:00.000Z");
    assert_eq!(image["tags"]["os"], "linux");
}

#[test]
fn query_pretty_and_callback() {
    let temp = tempdir().unwrap();

    configured(&temp)
        .args(["query", "ami=ami-old&pretty"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[\n {\n  \"id\": \"ami-old\""));

    configured(&temp)
        .args(["query", "ami=ami-old&pretty&callback=render"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("render([{\"id\":\"ami-old\""))
        .stdout(predicate::str::contains("]);"));
}

#[test]
fn query_table_output() {
    let temp = tempdir().unwrap();
    configured(&temp)
        .args(["query", "--format", "table", "region=us-east-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ami-new"))
        .stdout(predicate::str::contains("222222222222"))
        .stdout(predicate::str::contains("ami-old").not());
}

#[test]
fn query_without_launch_permissions() {
    let temp = tempdir().unwrap();
    let assert = configured(&temp)
        .env("AMIQUERY_COLLECT_LAUNCH_PERMISSIONS", "false")
        .args(["query", "launch_permission=999999999999"])
        .assert()
        .success();
    assert!(ids(&assert.get_output().stdout).is_empty());
}

#[test]
fn query_with_tag_filter() {
    let temp = tempdir().unwrap();
    let assert = configured(&temp)
        .env("AMIQUERY_TAG_FILTER", "missing-tag")
        .arg("query")
        .assert()
        .success();
    assert!(ids(&assert.get_output().stdout).is_empty());
}

#[test]
fn query_rejects_bad_input() {
    let temp = tempdir().unwrap();

    configured(&temp)
        .args(["query", "foo=bar"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            r#"{"id":"bad_request","message":"unknown query key: foo"}"#,
        ))
        .stderr(predicate::str::contains("unknown query key: foo"));

    configured(&temp)
        .args(["query", "tag=nocolon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid query tag value: nocolon"));

    configured(&temp)
        .args(["query", "region=eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown or unsupported region: eu-west-1"));
}

#[test]
fn query_denied_account_is_partial() {
    let temp = tempdir().unwrap();
    let assert = configured(&temp)
        .env("AMIQUERY_OWNER_IDS", "111111111111,333333333333")
        .arg("query")
        .assert()
        .success();
    assert_eq!(
        ids(&assert.get_output().stdout),
        vec!["ami-old", "ami-dep"]
    );
}

#[test]
fn cache_ttl_accepts_duration_strings() {
    let temp = tempdir().unwrap();

    configured(&temp)
        .env("AMIQUERY_CACHE_TTL", "15m")
        .arg("query")
        .assert()
        .success();

    ami_query(temp.path())
        .env("AMIQUERY_CACHE_TTL", "1h30m")
        .arg("regions")
        .assert()
        .success();

    ami_query(temp.path())
        .env("AMIQUERY_CACHE_TTL", "soon")
        .arg("regions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cache TTL"));
}

#[test]
fn query_requires_role_name() {
    let temp = tempdir().unwrap();
    configured(&temp)
        .env_remove("AMIQUERY_ROLE_NAME")
        .arg("query")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Role name is undefined"));
}

#[test]
fn query_requires_inventory() {
    let temp = tempdir().unwrap();
    configured(&temp)
        .env_remove("AMIQUERY_INVENTORY")
        .arg("query")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No inventory configured"));
}

#[test]
fn config_file_is_layered_under_environment() {
    let temp = tempdir().unwrap();
    let inventory = write_inventory(temp.path());
    let config = temp.path().join("config.yaml");
    fs::write(
        &config,
        format!(
            "role_name: ami-query\nowner_ids: ['111111111111']\nregions: [us-west-2]\ninventory: {}\n",
            inventory.display()
        ),
    )
    .unwrap();

    let assert = ami_query(temp.path())
        .args(["query", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert_eq!(ids(&assert.get_output().stdout), vec!["ami-old", "ami-dep"]);

    // Environment overrides the file.
    let assert = ami_query(temp.path())
        .env("AMIQUERY_OWNER_IDS", "222222222222")
        .env("AMIQUERY_REGIONS", "us-east-1")
        .args(["query", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert_eq!(ids(&assert.get_output().stdout), vec!["ami-new"]);
}

#[test]
fn missing_explicit_config_fails() {
    let temp = tempdir().unwrap();
    ami_query(temp.path())
        .args(["query", "--config", "/nonexistent/ami-query.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
