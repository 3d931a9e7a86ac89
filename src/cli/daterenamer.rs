//! # daterenamer
//!
//! Rename photos and videos after their creation date, read with exiftool.
//!
//! ```bash
//! daterenamer -r -o ~/Pictures/2023 ~/Downloads/phone
//! ```

use super::output::{batch_result, Console, Icon, Label, Verbosity};
use crate::core::apply::{Applier, ApplyOptions, Operation, Outcome, Summary};
use crate::core::collector::{CollectConfig, FileCollector};
use crate::core::external::catalog;
use crate::core::interrupt::{self, CancellationToken};
use crate::core::metadata::get_create_date;
use crate::core::naming::{date_prefix, lowercase_extension};
use crate::core::pool::WorkerPool;
use crate::error::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Rename photos and videos using their creation date
#[derive(Parser, Debug)]
#[command(name = "daterenamer", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Dry-run mode, do not change anything
    #[arg(short = 'n', long = "dryrun")]
    pub dry_run: bool,

    /// Parallel jobs
    #[arg(short, long, value_name = "THREADS")]
    pub jobs: Option<usize>,

    /// Visit folder content
    #[arg(short, long)]
    pub recursive: bool,

    /// Move renamed files in this folder
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Files to rename
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Whether `source` already carries `prefix` and lives where it should
pub fn is_already_named(source: &Path, prefix: &str, output: Option<&Path>) -> bool {
    let named = source
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(prefix));
    named && output.map_or(true, |folder| source.parent() == Some(folder))
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let exiftool = Arc::new(catalog::exiftool());
    exiftool.resolve()?;

    let collection = FileCollector::new(CollectConfig {
        recursive: args.recursive,
    })
    .collect(&args.files);
    console.skipped(&collection.skipped);

    let pool = WorkerPool::new(args.jobs, cancel)?;
    let mut completions = pool.run(collection.files, move |path| {
        get_create_date(&exiftool, path)
    });

    let mut applier = Applier::new(ApplyOptions {
        dry_run: args.dry_run,
        ..Default::default()
    });
    let mut summary = Summary::default();

    for result in completions.by_ref() {
        let source = result.path;
        let date = match result.outcome {
            Ok(date) => date,
            Err(error) => {
                summary.record_failure();
                console.error(
                    Icon::Boom,
                    format!("{} cannot be renamed: {}", Label::file(&source), Label::error(&error)),
                );
                continue;
            }
        };

        let prefix = date_prefix(&date);
        if is_already_named(&source, &prefix, args.output.as_deref()) {
            summary.record(&Outcome::AlreadyCorrect);
            console.detail(Icon::RedFlag, format!("{} is already renamed", Label::file(&source)));
            continue;
        }

        let folder = args
            .output
            .clone()
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let target = match applier.next_free_name(&folder, &prefix, &lowercase_extension(&source)) {
            Ok(target) => target,
            Err(error) => {
                let outcome = Outcome::Failed(error.into());
                console.outcome("renamed", &source, &folder, &outcome);
                summary.record(&outcome);
                continue;
            }
        };

        let outcome = applier.apply(&source, &target, Operation::Move);
        console.outcome("renamed", &source, &target, &outcome);
        summary.record(&outcome);
    }

    console.summary(&summary, "renamed");
    batch_result(&summary, completions.interrupted())
}
