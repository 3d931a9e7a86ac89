//! # Core Module
//!
//! Building blocks shared by the tools, free of any console output.
//!
//! ## Modules
//! - `collector` - Expands command line paths into files
//! - `external` - Locates and runs external binaries
//! - `pool` - Computes a property per file in parallel
//! - `apply` - Renames, copies, links and deletes without clobbering
//! - `interrupt` - Ctrl-C as a cancellation token
//! - `donelist` - Persisted list of processed items
//! - `hasher` / `naming` - Content fingerprints and names derived from them
//! - `metadata` - Creation dates read with exiftool
//! - `mime` - File type detection
//! - `media` / `images` - ffmpeg helpers and frame resizing
//! - `duplicates` - fdupes groups and deletion plans
//! - `shell` / `pty` - Interactive subshells

pub mod apply;
pub mod collector;
pub mod donelist;
pub mod duplicates;
pub mod external;
pub mod hasher;
pub mod images;
pub mod interrupt;
pub mod media;
pub mod metadata;
pub mod mime;
pub mod naming;
pub mod pool;
pub mod pty;
pub mod shell;

// Re-export commonly used types
pub use apply::{Applier, ApplyOptions, Operation, Outcome, Summary};
pub use collector::{CollectConfig, Collection, FileCollector};
pub use external::{ExternalTool, ToolCommand};
pub use hasher::HashAlgorithmKind;
pub use interrupt::CancellationToken;
pub use pool::{WorkResult, WorkerPool};
