//! # CLI Module
//!
//! One module per tool, each with its clap `Args` and a `run` entry point
//! returning the process exit code. The binaries in `src/bin` only parse
//! arguments, set up logging and call `run`.
//!
//! ## Usage
//! ```bash
//! # Rename pictures after their sha256, keeping the extension
//! hrenamer --sha256 -e -r ~/Pictures/inbox
//!
//! # Same, but only show what would happen
//! hrenamer --sha256 -e -r -n ~/Pictures/inbox
//!
//! # Delete duplicates of the sorted library found in Downloads
//! dupclean --keep ~/Pictures/sorted ~/Downloads --rm
//! ```

pub mod output;
pub mod prompt;

pub mod age_source;
pub mod batxaran;
pub mod daterenamer;
pub mod dispatch;
pub mod dupclean;
pub mod ezfuse;
pub mod hrenamer;
pub mod images_to_video;
pub mod remote_borg;
pub mod video_to_images;
pub mod virenamer;
