//! # External Module
//!
//! Locates and runs the external binaries the tools delegate to.
//!
//! ## Design
//! An [`ExternalTool`] knows a binary name, an optional environment variable
//! overriding it, arguments common to every call and an optional cheap probe
//! argument (`--version`). Resolution happens once per tool object and is
//! reused; each CLI builds its tools once and passes them around.
//!
//! Commands are always argument vectors. [`ToolCommand::shell`] is the only
//! way to get shell interpretation and is reserved for running user-written
//! command templates.
//!
//! ## Example
//! ```rust,ignore
//! let exiftool = ExternalTool::new("exiftool").common_args(["-G", "-j"]);
//! let json = exiftool.command([&path])?.output()?;
//! ```

pub mod catalog;
mod command;
mod tool;

pub use command::{quote, ToolCommand};
pub use tool::ExternalTool;
