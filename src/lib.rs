//! # filetools
//!
//! Small command-line utilities to rename, dispatch, deduplicate and process
//! files, most of them driving a well known external program.
//!
//! ## Architecture
//! Every tool follows the same flow:
//! parse, collect, compute (in parallel), apply (sequentially), summarize.
//! - `core` - The reusable stages and the external tool wrappers
//! - `error` - Error taxonomy and exit codes
//! - `cli` - One module per tool, plus shared console output

pub mod cli;
pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{Result, ToolError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr
///
/// `RUST_LOG` wins when set, otherwise `default_level` applies.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
