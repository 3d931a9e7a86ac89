//! # Apply Module
//!
//! Turns (source, target) decisions into filesystem changes without ever
//! overwriting something by accident.
//!
//! ## Classification
//! 1. source == target: already correct, nothing to do
//! 2. target taken (on disk or earlier in this run): collision, unless forced
//! 3. dry-run: simulated, counted as if applied
//! 4. otherwise the operation runs: applied, or failed
//!
//! Dry-runs keep track of the names they would take and free, so they report
//! the same counts as the real run.

mod executor;

pub use executor::{backup_path, ApplyOptions, Applier, MAX_SUFFIX_INDEX};

use crate::error::ToolError;
use std::fmt;

/// What to do with a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Move,
    Copy,
    /// Symbolic link pointing to the absolute source path
    Link,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Move => write!(f, "move"),
            Operation::Copy => write!(f, "copy"),
            Operation::Link => write!(f, "link"),
        }
    }
}

/// Result of one action
#[derive(Debug)]
pub enum Outcome {
    Applied,
    Simulated,
    AlreadyCorrect,
    Collision,
    Failed(ToolError),
}

/// Per-outcome counters of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub applied: usize,
    pub simulated: usize,
    pub already_correct: usize,
    pub collisions: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Simulated => self.simulated += 1,
            Outcome::AlreadyCorrect => self.already_correct += 1,
            Outcome::Collision => self.collisions += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// Count a failure that happened before any action was decided
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Applied or simulated, whichever the run did
    pub fn changed(&self) -> usize {
        self.applied + self.simulated
    }

    pub fn total(&self) -> usize {
        self.applied + self.simulated + self.already_correct + self.collisions + self.failed
    }

    /// Collisions and failures both make a batch unsuccessful
    pub fn errors(&self) -> usize {
        self.collisions + self.failed
    }
}
