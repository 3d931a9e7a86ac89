//! Integration tests for the rename tools.
//!
//! These tests run the tools end to end on temporary folders:
//! - Fingerprint collisions
//! - Dry-runs reporting the same outcome without touching anything
//! - Idempotent renames
//! - dispatch into matching subfolders

use assert_fs::prelude::*;
use assert_fs::TempDir;
use clap::Parser;
use filetools::cli::{dispatch, hrenamer};
use filetools::ToolError;
use predicates::prelude::*;
use std::path::Path;

/// md5 of the single byte `x`
const MD5_OF_X: &str = "9dd4e461268c8034f5c8564e155c67a6";

fn argv(fixed: &[&str], paths: &[&Path]) -> Vec<String> {
    fixed
        .iter()
        .map(|s| s.to_string())
        .chain(paths.iter().map(|p| p.display().to_string()))
        .collect()
}

fn same_content_pair() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("a.txt").write_str("x").unwrap();
    temp.child("b.txt").write_str("x").unwrap();
    temp
}

#[test]
fn identical_files_collide_on_their_fingerprint() {
    let temp = same_content_pair();
    let (a, b) = (temp.child("a.txt"), temp.child("b.txt"));

    let args = hrenamer::Args::try_parse_from(argv(
        &["hrenamer", "-q", "--md5"],
        &[a.path(), b.path()],
    ))
    .unwrap();
    let result = hrenamer::run(args);

    // One rename, one collision
    assert!(matches!(result, Err(ToolError::BatchFailed { failures: 1 })));
    temp.child(MD5_OF_X).assert("x");
    let remaining = [a.path().exists(), b.path().exists()];
    assert_eq!(remaining.iter().filter(|exists| **exists).count(), 1);
}

#[test]
fn dry_run_reports_the_same_and_changes_nothing() {
    let temp = same_content_pair();
    let (a, b) = (temp.child("a.txt"), temp.child("b.txt"));

    let args = hrenamer::Args::try_parse_from(argv(
        &["hrenamer", "-q", "-n"],
        &[a.path(), b.path()],
    ))
    .unwrap();
    let result = hrenamer::run(args);

    assert!(matches!(result, Err(ToolError::BatchFailed { failures: 1 })));
    a.assert("x");
    b.assert("x");
    temp.child(MD5_OF_X).assert(predicate::path::missing());
}

#[test]
fn renaming_twice_changes_nothing_the_second_time() {
    let temp = TempDir::new().unwrap();
    temp.child("photo.JPG").write_str("x").unwrap();

    let first = hrenamer::Args::try_parse_from(argv(
        &["hrenamer", "-q", "-e", "-r"],
        &[temp.path()],
    ))
    .unwrap();
    hrenamer::run(first).unwrap();

    let renamed = temp.child(format!("{}.JPG", MD5_OF_X));
    renamed.assert("x");

    let second = hrenamer::Args::try_parse_from(argv(
        &["hrenamer", "-q", "-e", "-r"],
        &[temp.path()],
    ))
    .unwrap();
    hrenamer::run(second).unwrap();

    renamed.assert("x");
}

#[test]
fn prefix_suffix_and_length() {
    let temp = TempDir::new().unwrap();
    temp.child("in/doc.pdf").write_str("x").unwrap();
    temp.child("out").create_dir_all().unwrap();

    let args = hrenamer::Args::try_parse_from(argv(
        &["hrenamer", "-q", "-l", "8", "-p", "doc-", "-s", "_v1", "-e", "-o"],
        &[temp.child("out").path(), temp.child("in/doc.pdf").path()],
    ))
    .unwrap();
    hrenamer::run(args).unwrap();

    temp.child("out/doc-9dd4e461_v1.pdf").assert("x");
    temp.child("in/doc.pdf").assert(predicate::path::missing());
}

#[test]
fn directories_need_recursion() {
    let temp = TempDir::new().unwrap();
    temp.child("folder/file.txt").write_str("x").unwrap();

    let args =
        hrenamer::Args::try_parse_from(argv(&["hrenamer", "-q"], &[temp.child("folder").path()]))
            .unwrap();
    hrenamer::run(args).unwrap();

    temp.child("folder/file.txt").assert("x");
}

#[cfg(unix)]
#[test]
fn dispatch_links_into_the_longest_matching_folder() {
    let temp = TempDir::new().unwrap();
    temp.child("sorted/bank").create_dir_all().unwrap();
    temp.child("sorted/bank-statement").create_dir_all().unwrap();
    temp.child("bank-statement-2024-01.pdf").write_str("pdf").unwrap();

    let args = dispatch::Args::try_parse_from(argv(
        &["dispatch", "-q", "-l", "-o"],
        &[
            temp.child("sorted").path(),
            temp.child("bank-statement-2024-01.pdf").path(),
        ],
    ))
    .unwrap();
    dispatch::run(args).unwrap();

    let link = temp.child("sorted/bank-statement/bank-statement-2024-01.pdf");
    link.assert(predicate::path::is_symlink());
    link.assert("pdf");
    temp.child("bank-statement-2024-01.pdf").assert(predicate::path::exists());
}
