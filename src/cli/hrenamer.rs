//! # hrenamer
//!
//! Rename files after their content fingerprint.
//!
//! ```bash
//! hrenamer --sha256 -l 16 -e -r ~/Pictures/inbox
//! ```

use super::output::{batch_result, Console, Icon, Label, Verbosity};
use crate::core::apply::{Applier, ApplyOptions, Operation, Summary};
use crate::core::collector::{CollectConfig, FileCollector};
use crate::core::external::catalog;
use crate::core::hasher::{hash_file, HashAlgorithmKind};
use crate::core::interrupt::{self, CancellationToken};
use crate::core::mime::guess_extension;
use crate::core::naming::{compute_filename, current_extension, validate_name_part, NameOptions};
use crate::core::pool::WorkerPool;
use crate::error::Result;
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Rename files using their content fingerprint
#[derive(Parser, Debug)]
#[command(name = "hrenamer", version, about)]
#[command(group(ArgGroup::new("algorithm").args(["md5", "sha1", "sha224", "sha256", "sha384", "sha512"])))]
#[command(group(ArgGroup::new("extension").args(["ext", "auto_ext"])))]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Dry-run mode, do not change anything
    #[arg(short = 'n', long = "dryrun")]
    pub dry_run: bool,

    /// Parallel jobs
    #[arg(short, long, value_name = "THREADS")]
    pub jobs: Option<usize>,

    /// Use md5 to compute file fingerprint (default)
    #[arg(long)]
    pub md5: bool,
    /// Use sha1 to compute file fingerprint
    #[arg(long)]
    pub sha1: bool,
    /// Use sha224 to compute file fingerprint
    #[arg(long)]
    pub sha224: bool,
    /// Use sha256 to compute file fingerprint
    #[arg(long)]
    pub sha256: bool,
    /// Use sha384 to compute file fingerprint
    #[arg(long)]
    pub sha384: bool,
    /// Use sha512 to compute file fingerprint
    #[arg(long)]
    pub sha512: bool,

    /// Visit folder content
    #[arg(short, long)]
    pub recursive: bool,

    /// Truncate fingerprint to N chars, 0 keeps it whole
    #[arg(short = 'l', long = "len", value_name = "N", default_value_t = 0)]
    pub length: usize,

    /// Prefix filename with PREFIX
    #[arg(short, long, value_parser = validate_name_part)]
    pub prefix: Option<String>,

    /// Suffix filename with SUFFIX
    #[arg(short, long, value_parser = validate_name_part)]
    pub suffix: Option<String>,

    /// Append current file extension to target filename
    #[arg(short = 'e', long = "ext")]
    pub ext: bool,

    /// Append extension guessed from the content
    #[arg(short = 'E', long = "auto-ext")]
    pub auto_ext: bool,

    /// Rename files in specific folder
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Files to rename
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Args {
    pub fn algorithm(&self) -> HashAlgorithmKind {
        if self.sha1 {
            HashAlgorithmKind::Sha1
        } else if self.sha224 {
            HashAlgorithmKind::Sha224
        } else if self.sha256 {
            HashAlgorithmKind::Sha256
        } else if self.sha384 {
            HashAlgorithmKind::Sha384
        } else if self.sha512 {
            HashAlgorithmKind::Sha512
        } else {
            HashAlgorithmKind::Md5
        }
    }
}

/// Fingerprint and guessed extension of one file
struct Computed {
    fingerprint: String,
    guessed_extension: Option<String>,
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let collection = FileCollector::new(CollectConfig {
        recursive: args.recursive,
    })
    .collect(&args.files);
    console.skipped(&collection.skipped);

    let file_tool = Arc::new(catalog::file());
    if args.auto_ext {
        file_tool.resolve()?;
    }

    let pool = WorkerPool::new(args.jobs, cancel)?;
    let algorithm = args.algorithm();
    let auto_ext = args.auto_ext;
    let mut completions = pool.run(collection.files, move |path| {
        let fingerprint = hash_file(path, algorithm)?;
        let guessed_extension = if auto_ext {
            guess_extension(&file_tool, path)?
        } else {
            None
        };
        Ok(Computed {
            fingerprint,
            guessed_extension,
        })
    });

    let mut applier = Applier::new(ApplyOptions {
        dry_run: args.dry_run,
        ..Default::default()
    });
    let mut summary = Summary::default();

    for result in completions.by_ref() {
        let source = result.path;
        let computed = match result.outcome {
            Ok(computed) => computed,
            Err(error) => {
                summary.record_failure();
                console.error(
                    Icon::Boom,
                    format!("{} cannot be renamed: {}", Label::file(&source), Label::error(&error)),
                );
                continue;
            }
        };

        let target = target_path(&args, &source, computed);
        let outcome = applier.apply(&source, &target, Operation::Move);
        console.outcome("renamed", &source, &target, &outcome);
        summary.record(&outcome);
    }

    console.summary(&summary, "renamed");
    batch_result(&summary, completions.interrupted())
}

fn target_path(args: &Args, source: &Path, computed: Computed) -> PathBuf {
    let extension = if args.ext {
        current_extension(source)
    } else {
        computed.guessed_extension
    };
    let name = compute_filename(
        &computed.fingerprint,
        &NameOptions {
            length: args.length,
            prefix: args.prefix.clone(),
            suffix: args.suffix.clone(),
            extension,
        },
    );
    let folder = args
        .output
        .clone()
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    folder.join(name)
}
