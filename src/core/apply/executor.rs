//! Executor for rename, copy, link and delete actions.

use super::{Operation, Outcome};
use crate::error::{ApplyError, ToolError};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Last index tried by [`Applier::next_free_name`]
pub const MAX_SUFFIX_INDEX: u32 = 999;

/// Options shared by every action of a run
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Report what would happen without touching anything
    pub dry_run: bool,
    /// Overwrite existing targets
    pub force: bool,
    /// Keep a `.bak` copy of a target before overwriting it
    pub backup: bool,
}

/// Applies actions and remembers which names the run took or freed
#[derive(Debug, Default)]
pub struct Applier {
    options: ApplyOptions,
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl Applier {
    pub fn new(options: ApplyOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> ApplyOptions {
        self.options
    }

    /// Whether `path` is taken, on disk or by an earlier action of this run
    pub fn is_occupied(&self, path: &Path) -> bool {
        if self.claimed.contains(path) {
            return true;
        }
        // symlink_metadata: a dangling link still occupies the name
        path.symlink_metadata().is_ok() && !self.vacated.contains(path)
    }

    /// Move, copy or link `source` to `target`
    pub fn apply(&mut self, source: &Path, target: &Path, operation: Operation) -> Outcome {
        if source == target {
            return Outcome::AlreadyCorrect;
        }

        let occupied = self.is_occupied(target);
        if occupied && !self.options.force {
            return Outcome::Collision;
        }

        if self.options.dry_run {
            self.claim(source, target, operation);
            return Outcome::Simulated;
        }

        match self.perform(source, target, operation, occupied) {
            Ok(()) => {
                debug!(source = %source.display(), target = %target.display(), %operation, "applied");
                self.claim(source, target, operation);
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Delete a file or a whole directory
    pub fn delete(&mut self, path: &Path) -> Outcome {
        if path.symlink_metadata().is_err() || self.vacated.contains(path) {
            return Outcome::Failed(ApplyError::SourceMissing { path: path.to_path_buf() }.into());
        }
        if self.options.dry_run {
            self.vacated.insert(path.to_path_buf());
            return Outcome::Simulated;
        }

        let result = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "deleted");
                self.vacated.insert(path.to_path_buf());
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(ToolError::io(path, e)),
        }
    }

    /// First free `{prefix}{NNN}{suffix}` in `folder`, NNN from 001 to 999
    pub fn next_free_name(
        &self,
        folder: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<PathBuf, ApplyError> {
        (1..=MAX_SUFFIX_INDEX)
            .map(|index| folder.join(format!("{}{:03}{}", prefix, index, suffix)))
            .find(|candidate| !self.is_occupied(candidate))
            .ok_or_else(|| ApplyError::NoFreeName {
                folder: folder.to_path_buf(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                bound: MAX_SUFFIX_INDEX,
            })
    }

    fn claim(&mut self, source: &Path, target: &Path, operation: Operation) {
        self.claimed.insert(target.to_path_buf());
        self.vacated.remove(target);
        if operation == Operation::Move {
            self.claimed.remove(source);
            self.vacated.insert(source.to_path_buf());
        }
    }

    fn perform(
        &self,
        source: &Path,
        target: &Path,
        operation: Operation,
        overwrite: bool,
    ) -> Result<(), ToolError> {
        // The file may have changed since it was collected
        if source.symlink_metadata().is_err() {
            return Err(ApplyError::SourceMissing {
                path: source.to_path_buf(),
            }
            .into());
        }

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ToolError::io(parent, e))?;
            }
        }

        if overwrite && target.symlink_metadata().is_ok() {
            if self.options.backup {
                let backup = backup_path(target);
                fs::rename(target, &backup).map_err(|e| ToolError::io(target, e))?;
                debug!(backup = %backup.display(), "existing target saved");
            } else if operation == Operation::Link || target.is_dir() {
                remove_existing(target).map_err(|e| ToolError::io(target, e))?;
            }
        }

        match operation {
            Operation::Move => move_file(source, target),
            Operation::Copy => fs::copy(source, target)
                .map(|_| ())
                .map_err(|e| ToolError::io(source, e)),
            Operation::Link => {
                let absolute = fs::canonicalize(source).map_err(|e| ToolError::io(source, e))?;
                symlink(&absolute, target).map_err(|e| ToolError::io(target, e))
            }
        }
    }
}

/// `name` → `name.bak` next to it
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(".bak");
    path.with_file_name(name)
}

fn remove_existing(path: &Path) -> io::Result<()> {
    if path.is_dir() && !path.is_symlink() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn move_file(source: &Path, target: &Path) -> Result<(), ToolError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    // rename fails across filesystems, fall back to copy+delete
    // with size verification before deleting source
    let source_size = fs::metadata(source)
        .map_err(|e| ToolError::io(source, e))?
        .len();
    fs::copy(source, target).map_err(|e| ToolError::io(source, e))?;

    let target_size = fs::metadata(target)
        .map_err(|e| ToolError::io(target, e))?
        .len();
    if target_size != source_size {
        let _ = fs::remove_file(target);
        return Err(ApplyError::CopyMismatch {
            path: source.to_path_buf(),
            expected: source_size,
            actual: target_size,
        }
        .into());
    }

    fs::remove_file(source).map_err(|e| ToolError::io(source, e))
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    if original.is_dir() {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}
