//! Integration tests for the CLI command implementations.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use conda_envfile::{
    check::run_check,
    console_utils::IndicatifWriter,
    fmt::run_fmt,
    list::render_list,
    opt::{CheckOpts, FmtOpts},
};
use envfile_parser::EnvironmentFile;

fn write_manifest(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs_err::write(&path, contents).unwrap();
    path
}

#[test]
fn check_accepts_a_valid_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        &dir,
        "environment.yml",
        "name: ci\nchannels:\n  - conda-forge\ndependencies:\n  - numpy<1.24.0\n  - boto3\n",
    );

    let result = run_check(CheckOpts {
        files: vec![path],
        strict: false,
    });
    assert!(result.is_ok());
}

#[test]
fn check_rejects_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        &dir,
        "environment.yml",
        "dependencies:\n  - numpy<1.24.0\n  - numpy\n",
    );

    let result = run_check(CheckOpts {
        files: vec![path],
        strict: false,
    });
    assert!(result.is_err());
}

#[test]
fn strict_mode_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        &dir,
        "environment.yml",
        "channels:\n  - conda-forge\n  - conda-forge\ndependencies:\n  - boto3\n",
    );

    assert!(
        run_check(CheckOpts {
            files: vec![path.clone()],
            strict: false,
        })
        .is_ok()
    );
    assert!(
        run_check(CheckOpts {
            files: vec![path],
            strict: true,
        })
        .is_err()
    );
}

#[test]
fn fmt_rewrites_to_canonical_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        &dir,
        "environment.yml",
        "name: ci\ndependencies:\n  - meson >= 1.2.1\n",
    );

    run_fmt(FmtOpts {
        file: path.clone(),
        check: false,
    })
    .unwrap();

    let rewritten = fs_err::read_to_string(&path).unwrap();
    assert_eq!(rewritten, "name: ci\ndependencies:\n  - meson>=1.2.1\n");

    // A second pass is a no-op and `--check` passes.
    run_fmt(FmtOpts {
        file: path.clone(),
        check: true,
    })
    .unwrap();
}

#[test]
fn fmt_check_fails_on_non_canonical_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(&dir, "environment.yml", "name: ci\ndependencies:\n  - a ==1\n");
    let before = fs_err::read_to_string(&path).unwrap();

    let result = run_fmt(FmtOpts {
        file: path.clone(),
        check: true,
    });
    assert!(result.is_err());
    // --check never writes.
    assert_eq!(fs_err::read_to_string(&path).unwrap(), before);
}

#[test]
fn fmt_keeps_comments_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        &dir,
        "environment.yml",
        "\
name: ci
channels:
  # primary channel, do not reorder
  - conda-forge
dependencies:
  - boto3   # needed for s3 tests
",
    );

    run_fmt(FmtOpts {
        file: path.clone(),
        check: false,
    })
    .unwrap();

    let rewritten = fs_err::read_to_string(&path).unwrap();
    assert!(rewritten.contains("  # primary channel, do not reorder\n"));
    assert!(rewritten.contains("  - boto3 # needed for s3 tests\n"));
}

const LISTABLE: &str = "\
name: ci
dependencies:
  # test dependencies
  - pytest>=6.0
  - coverage[toml]
  # optional dependencies
  - boto3
";

#[test]
fn list_prints_every_group() {
    console::set_colors_enabled(false);
    let env = EnvironmentFile::from_source(LISTABLE).unwrap();
    let output = render_list(&env, None, false).unwrap();
    assert_eq!(
        output,
        "# test dependencies\npytest>=6.0\ncoverage[toml]\n# optional dependencies\nboto3\n"
    );
}

#[test]
fn list_selects_groups_by_substring() {
    console::set_colors_enabled(false);
    let env = EnvironmentFile::from_source(LISTABLE).unwrap();
    let output = render_list(&env, Some("optional"), false).unwrap();
    assert_eq!(output, "# optional dependencies\nboto3\n");
}

#[test]
fn list_rejects_an_unknown_group() {
    let env = EnvironmentFile::from_source(LISTABLE).unwrap();
    let err = render_list(&env, Some("build"), false).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("no group header matches 'build'"));
    assert!(message.contains("test dependencies"));
}

#[test]
fn list_can_hide_unconstrained_entries() {
    console::set_colors_enabled(false);
    let env = EnvironmentFile::from_source(LISTABLE).unwrap();
    let output = render_list(&env, None, true).unwrap();
    assert!(output.contains("pytest>=6.0\n"));
    assert!(!output.contains("boto3"));
    assert!(!output.contains("coverage"));
}

#[test]
fn progress_writer_is_usable_from_callers() {
    let writer = IndicatifWriter::new(indicatif::MultiProgress::new());
    let _ = writer.clone();
}
