//! Ctrl-C handling.
//!
//! The first SIGINT only flips a [`CancellationToken`] so that tools can stop
//! scheduling work and save their state; a second one terminates the process.

use crate::error::{Result, ToolError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag telling workers and loops to stop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Route SIGINT to `token`
pub fn install(token: &CancellationToken) -> Result<()> {
    use signal_hook::consts::SIGINT;
    use signal_hook::flag;

    let to_config = |e: std::io::Error| ToolError::Config(format!("cannot handle Ctrl-C: {}", e));

    // Registered first so it sees the flag before the second handler sets it
    #[cfg(unix)]
    flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&token.flag)).map_err(to_config)?;
    flag::register(SIGINT, Arc::clone(&token.flag)).map_err(to_config)?;
    Ok(())
}
