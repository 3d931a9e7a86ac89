//! # Collector Module
//!
//! Expands the paths given on the command line into the files to process.
//!
//! ## Rules
//! - Files are yielded once, sorted by path string
//! - Directories are expanded only when recursion is enabled
//! - Anything else (broken symlink, fifo, missing path) is skipped and
//!   reported, collection itself never fails
//!
//! ## Example
//! ```rust,ignore
//! use filetools::core::collector::{CollectConfig, FileCollector};
//!
//! let collection = FileCollector::new(CollectConfig { recursive: true })
//!     .collect(&["/photos".into()]);
//! ```

mod walker;

pub use walker::{CollectConfig, FileCollector};

use std::fmt;
use std::path::PathBuf;

/// Why an input was not collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A directory was given but recursion is disabled
    DirectoryNotRecursed,
    /// Neither a regular file nor a directory
    NotAFile,
    /// The entry could not be read (missing, broken link, permission denied)
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DirectoryNotRecursed => {
                write!(f, "is ignored, use --recursive to process directory")
            }
            SkipReason::NotAFile => write!(f, "is ignored, not a file nor a directory"),
            SkipReason::Unreadable(reason) => write!(f, "is ignored, {}", reason),
        }
    }
}

/// An input that was left out of the collection
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of a collection
#[derive(Debug, Default)]
pub struct Collection {
    /// Files to process, sorted and unique
    pub files: Vec<PathBuf>,
    /// Inputs that were skipped
    pub skipped: Vec<SkippedEntry>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
