//! Interactive child processes behind a pseudo-terminal.
//!
//! The local terminal is switched to raw mode for the whole interaction and
//! restored when the bridge ends, whatever the outcome.

use crate::core::external::ToolCommand;
use crate::error::{ExternalError, Result};
use crossbeam_channel::bounded;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{self, IsTerminal, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Time left to the output relay to drain once the child has exited
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

type SharedMaster = Arc<Mutex<Box<dyn MasterPty + Send>>>;
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// A child process attached to a pty, relayed to the local terminal
pub struct PtyBridge {
    command: String,
    master: SharedMaster,
    writer: SharedWriter,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyBridge {
    /// Spawn `command` on a new pty sized like the local terminal
    pub fn spawn(command: &ToolCommand) -> Result<Self> {
        let description = command.to_string();
        let failure = |e: &dyn std::fmt::Display| ExternalError::Spawn {
            command: description.clone(),
            source: io::Error::other(e.to_string()),
        };

        let pair = native_pty_system()
            .openpty(terminal_size())
            .map_err(|e| failure(&e))?;

        let argv = command.argv();
        let mut builder = CommandBuilder::new(&argv[0]);
        builder.args(&argv[1..]);
        for (key, value) in command.envs() {
            builder.env(key, value);
        }
        if let Some(cwd) = command.cwd() {
            builder.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| failure(&e))?;
        // Only the child keeps the slave side open, so the output relay sees
        // EOF when it exits
        drop(pair.slave);

        let writer = pair.master.take_writer().map_err(|e| failure(&e))?;
        debug!(command = %description, "spawned on a pty");

        Ok(Self {
            command: description,
            master: Arc::new(Mutex::new(pair.master)),
            writer: Arc::new(Mutex::new(writer)),
            child,
        })
    }

    /// Type a line into the child, before the user takes over
    pub fn send_line(&self, line: &str) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| self.broken("writer lock poisoned"))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| self.broken(&e.to_string()))?;
        Ok(())
    }

    /// Relay the terminal until the child exits, return its exit code
    pub fn interact(mut self) -> Result<u32> {
        let _raw = RawModeGuard::enable();

        let mut reader = self
            .master
            .lock()
            .map_err(|_| self.broken("master lock poisoned"))?
            .try_clone_reader()
            .map_err(|e| self.broken(&e.to_string()))?;

        let writer = Arc::clone(&self.writer);
        thread::spawn(move || relay_stdin(writer));

        let (done_tx, done_rx) = bounded::<()>(1);
        thread::spawn(move || {
            let mut stdout = io::stdout();
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stdout.write_all(&buffer[..n]).and_then(|_| stdout.flush()).is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = done_tx.send(());
        });

        let resize = ResizeForwarder::start(Arc::clone(&self.master));

        let status = self.child.wait().map_err(|source| ExternalError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        let _ = done_rx.recv_timeout(DRAIN_TIMEOUT);
        drop(resize);

        debug!(command = %self.command, code = status.exit_code(), "pty child exited");
        Ok(status.exit_code())
    }

    fn broken(&self, reason: &str) -> ExternalError {
        ExternalError::Spawn {
            command: self.command.clone(),
            source: io::Error::other(reason.to_string()),
        }
    }
}

fn relay_stdin(writer: SharedWriter) {
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 1024];
    loop {
        let n = match stdin.read(&mut buffer) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Ok(mut writer) = writer.lock() else {
            return;
        };
        if writer.write_all(&buffer[..n]).and_then(|_| writer.flush()).is_err() {
            return;
        }
    }
}

fn terminal_size() -> PtySize {
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Raw mode on the local terminal while alive, when stdin is a terminal
struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    fn enable() -> Self {
        let enabled = io::stdin().is_terminal() && crossterm::terminal::enable_raw_mode().is_ok();
        Self { enabled }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = crossterm::terminal::disable_raw_mode();
        }
    }
}

/// Forwards SIGWINCH to the pty until dropped
struct ResizeForwarder {
    #[cfg(unix)]
    handle: Option<signal_hook::iterator::Handle>,
}

impl ResizeForwarder {
    #[cfg(unix)]
    fn start(master: SharedMaster) -> Self {
        use signal_hook::consts::SIGWINCH;
        use signal_hook::iterator::Signals;

        let Ok(mut signals) = Signals::new([SIGWINCH]) else {
            return Self { handle: None };
        };
        let handle = signals.handle();
        thread::spawn(move || {
            for _ in signals.forever() {
                if let Ok(master) = master.lock() {
                    let _ = master.resize(terminal_size());
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    #[cfg(not(unix))]
    fn start(_master: SharedMaster) -> Self {
        Self {}
    }
}

impl Drop for ResizeForwarder {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(handle) = &self.handle {
            handle.close();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn exit_code_of_the_child_is_returned() {
        let command = ToolCommand::new("sh").args(["-c", "exit 3"]);
        let bridge = match PtyBridge::spawn(&command) {
            Ok(bridge) => bridge,
            Err(e) => {
                println!("Skipping pty test: {}", e);
                return;
            }
        };

        assert_eq!(bridge.interact().unwrap(), 3);
    }

    #[test]
    fn lines_are_typed_into_the_child() {
        let temp = tempfile::tempdir().unwrap();
        let marker = temp.path().join("marker");
        let command = ToolCommand::new("sh").arg("-c").arg(format!(
            "read line && echo \"$line\" > '{}'",
            marker.display()
        ));
        let bridge = match PtyBridge::spawn(&command) {
            Ok(bridge) => bridge,
            Err(e) => {
                println!("Skipping pty test: {}", e);
                return;
            }
        };

        bridge.send_line("hello").unwrap();
        assert_eq!(bridge.interact().unwrap(), 0);

        let content = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(content.trim(), "hello");
    }
}
