//! Integration tests for the collect, compute, apply stages.
//!
//! These tests verify the building blocks shared by every tool:
//! - Collection of mixed inputs
//! - Failure isolation in the worker pool
//! - Dry-runs counting exactly like real runs

use filetools::core::apply::{Applier, ApplyOptions, Operation, Outcome, Summary};
use filetools::core::collector::{CollectConfig, FileCollector};
use filetools::core::hasher::{hash_file, HashAlgorithmKind};
use filetools::core::interrupt::CancellationToken;
use filetools::core::pool::WorkerPool;
use filetools::ToolError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn collection_is_unique_and_only_files() {
    let temp_dir = TempDir::new().unwrap();
    let a = write(temp_dir.path(), "a.jpg", "a");
    write(temp_dir.path(), "nested/b.jpg", "b");

    let flat = FileCollector::new(CollectConfig { recursive: false })
        .collect(&[a.clone(), a.clone(), temp_dir.path().to_path_buf()]);
    assert_eq!(flat.files, vec![a.clone()]);
    assert_eq!(flat.skipped.len(), 1);

    let deep = FileCollector::new(CollectConfig { recursive: true })
        .collect(&[temp_dir.path().to_path_buf(), a.clone()]);
    assert_eq!(deep.len(), 2);
    assert!(deep.files.iter().all(|f| f.is_file()));
}

#[test]
fn one_failure_does_not_stop_the_others() {
    let temp_dir = TempDir::new().unwrap();
    let mut files: Vec<PathBuf> = (0..8)
        .map(|i| write(temp_dir.path(), &format!("{}.txt", i), &i.to_string()))
        .collect();
    let vanished = temp_dir.path().join("vanished.txt");
    files.push(vanished.clone());

    let pool = WorkerPool::new(Some(3), CancellationToken::new()).unwrap();
    let results: Vec<_> = pool
        .run(files, |path| hash_file(path, HashAlgorithmKind::Sha1))
        .collect();

    assert_eq!(results.len(), 9);
    let failures: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, vanished);
}

#[test]
fn a_panicking_job_only_fails_its_file() {
    let temp_dir = TempDir::new().unwrap();
    let files = vec![
        write(temp_dir.path(), "fine.txt", "ok"),
        write(temp_dir.path(), "boom.txt", "ko"),
    ];

    let pool = WorkerPool::new(Some(2), CancellationToken::new()).unwrap();
    let results: Vec<_> = pool
        .run(files, |path| {
            if path.ends_with("boom.txt") {
                panic!("unexpected content");
            }
            Ok(())
        })
        .collect();

    assert_eq!(results.len(), 2);
    let panicked = results
        .iter()
        .filter(|r| matches!(r.outcome, Err(ToolError::Panicked(_))))
        .count();
    assert_eq!(panicked, 1);
}

/// Chain of renames where each target is freed by the previous move
fn rotate(applier: &mut Applier, dir: &Path) -> Summary {
    let mut summary = Summary::default();
    let moves = [("b", "c"), ("a", "b"), ("x", "a"), ("a", "a")];
    for (source, target) in moves {
        let outcome = applier.apply(&dir.join(source), &dir.join(target), Operation::Move);
        summary.record(&outcome);
    }
    summary
}

#[test]
fn dry_run_counts_like_the_real_run() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["a", "b", "x"] {
        write(temp_dir.path(), name, name);
    }

    let mut simulated = Applier::new(ApplyOptions {
        dry_run: true,
        ..Default::default()
    });
    let dry = rotate(&mut simulated, temp_dir.path());
    assert_eq!(fs::read_to_string(temp_dir.path().join("a")).unwrap(), "a");
    assert!(!temp_dir.path().join("c").exists());

    let mut real = Applier::new(ApplyOptions::default());
    let wet = rotate(&mut real, temp_dir.path());

    assert_eq!(dry.simulated, wet.applied);
    assert_eq!(dry.already_correct, wet.already_correct);
    assert_eq!(dry.collisions, wet.collisions);
    assert_eq!(wet.applied, 3);
    assert_eq!(fs::read_to_string(temp_dir.path().join("c")).unwrap(), "b");
    assert_eq!(fs::read_to_string(temp_dir.path().join("a")).unwrap(), "x");
}

#[test]
fn numbered_names_skip_taken_ones() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "2023-07-04_10h20m30s_001.jpg", "");

    let mut applier = Applier::new(ApplyOptions::default());
    let source = write(temp_dir.path(), "IMG_1.jpg", "1");
    let first = applier
        .next_free_name(temp_dir.path(), "2023-07-04_10h20m30s_", ".jpg")
        .unwrap();
    assert!(first.ends_with("2023-07-04_10h20m30s_002.jpg"));
    assert!(matches!(
        applier.apply(&source, &first, Operation::Move),
        Outcome::Applied
    ));

    let second = applier
        .next_free_name(temp_dir.path(), "2023-07-04_10h20m30s_", ".jpg")
        .unwrap();
    assert!(second.ends_with("2023-07-04_10h20m30s_003.jpg"));
}
