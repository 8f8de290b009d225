//! End-to-end tests driving the built `checkmerge` binary, following the teacher's
//! pattern of discovering fixture directories under `tests/fixtures/` and feeding their
//! revision files through the CLI.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;

fn fixture(name: &str, file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .join(file)
}

fn checkmerge() -> Command {
    Command::cargo_bin("checkmerge").expect("the checkmerge binary should have been built")
}

#[rstest]
#[case("rename")]
#[case("insert")]
fn diff_prints_a_change_per_fixture(#[case] name: &str) {
    checkmerge()
        .arg("diff")
        .arg(fixture(name, "base.sexpr"))
        .arg(fixture(name, "other.sexpr"))
        .assert()
        .success()
        .stdout(predicates::str::is_empty().not());
}

#[test]
fn diff_of_identical_files_prints_nothing() {
    checkmerge()
        .arg("diff")
        .arg(fixture("rename", "base.sexpr"))
        .arg(fixture("rename", "base.sexpr"))
        .assert()
        .success()
        .stdout("");
}

#[test]
fn diff_fails_on_a_missing_file() {
    checkmerge()
        .arg("diff")
        .arg(fixture("rename", "base.sexpr"))
        .arg(fixture("rename", "does-not-exist.sexpr"))
        .assert()
        .failure();
}

#[test]
fn analyze_runs_against_a_degenerate_two_way_ancestor() {
    checkmerge()
        .arg("analyze")
        .arg(fixture("rename", "base.sexpr"))
        .arg(fixture("rename", "other.sexpr"))
        .assert()
        .success();
}

#[test]
fn analyze_rejects_an_unknown_analysis_name() {
    checkmerge()
        .arg("analyze")
        .arg("--analysis")
        .arg("nonexistent")
        .arg(fixture("rename", "base.sexpr"))
        .arg(fixture("rename", "other.sexpr"))
        .assert()
        .failure();
}

#[test]
fn list_parsers_mentions_the_bundled_sexpr_parser() {
    checkmerge()
        .arg("list-parsers")
        .assert()
        .success()
        .stdout(predicates::str::contains("sexpr"));
}

#[test]
fn list_analysis_mentions_both_built_in_analyses() {
    checkmerge()
        .arg("list-analysis")
        .assert()
        .success()
        .stdout(predicates::str::contains("dependence"))
        .stdout(predicates::str::contains("reference"));
}

#[test]
fn list_plugins_with_disabled_flag_reports_none() {
    checkmerge()
        .arg("list-plugins")
        .arg("--disabled")
        .assert()
        .success()
        .stdout(predicates::str::contains("No disabled plugins"));
}
