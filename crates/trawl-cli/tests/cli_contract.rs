#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn trawl() -> Command {
    let mut cmd = Command::cargo_bin("trawl").expect("trawl binary");
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env_remove("TRAWL_GITHUB_API_URL")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn contract_version_prints_full_version() {
    trawl()
        .arg("version")
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with(format!(
            "trawl v{}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn contract_version_flag_matches_version_command() {
    let flag = trawl().arg("--version").assert().code(0);
    let command = trawl().arg("version").assert().code(0);

    let flag_out = String::from_utf8(flag.get_output().stdout.clone()).unwrap();
    let command_out = String::from_utf8(command.get_output().stdout.clone()).unwrap();
    assert!(flag_out.starts_with(&format!("trawl v{}", env!("CARGO_PKG_VERSION"))));
    assert_eq!(flag_out.trim_end(), command_out.trim_end());
}

#[test]
fn contract_bad_repo_slug_exits_1() {
    trawl()
        .args(["run", "--repo", "etcd-io/etcd/extra", "--max-age", "1h"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "expected form owner/repo, but 3 segments were found",
        ));
}

#[test]
fn contract_missing_max_age_exits_1() {
    trawl()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--max-age"));
}

#[test]
fn contract_zero_concurrency_is_a_config_error() {
    trawl()
        .args(["run", "--max-age", "1h", "--concurrency", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("concurrency must be at least 1"));
}

#[test]
fn contract_unreachable_api_exits_1() {
    let work = tempfile::tempdir().unwrap();
    trawl()
        .args(["run", "--max-age", "1h", "--api-url", "http://127.0.0.1:1"])
        .arg("--work-dir")
        .arg(work.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: analysis failed"));
}

#[test]
fn contract_help_exits_0() {
    trawl()
        .args(["run", "--help"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("--max-age"));
}
