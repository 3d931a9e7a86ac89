//! Line prompts on stdin that can time out or be cancelled.
//!
//! Nothing is read from stdin until a question is asked, so child processes
//! started between two questions get the input meant for them.

use crate::core::interrupt::CancellationToken;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::fs::File;
#[cfg(unix)]
use std::io::BufReader;
#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a prompt got back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Line(String),
    TimedOut,
    /// stdin reached EOF
    Closed,
    Cancelled,
}

/// Reads one line per question
pub struct Prompt {
    reader: RefCell<Box<dyn BufRead>>,
    /// Polled before reading, readers without one are always ready
    #[cfg(unix)]
    fd: Option<RawFd>,
}

impl Prompt {
    /// Prompt reading the process stdin
    #[cfg(unix)]
    pub fn stdin() -> Self {
        match io::stdin().as_fd().try_clone_to_owned() {
            Ok(fd) => Self::unbuffered(fd),
            Err(_) => Self::from_reader(io::stdin().lock()),
        }
    }

    #[cfg(not(unix))]
    pub fn stdin() -> Self {
        Self::from_reader(io::stdin().lock())
    }

    /// Prompt over an in-memory or already buffered reader
    pub fn from_reader<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            reader: RefCell::new(Box::new(reader)),
            #[cfg(unix)]
            fd: None,
        }
    }

    /// Prompt over a descriptor, read byte by byte so the input after the
    /// answer stays for whoever reads the descriptor next
    #[cfg(unix)]
    pub fn unbuffered(fd: OwnedFd) -> Self {
        let raw = fd.as_raw_fd();
        Self {
            reader: RefCell::new(Box::new(BufReader::with_capacity(1, File::from(fd)))),
            fd: Some(raw),
        }
    }

    /// Print `question` without newline and wait for a line
    pub fn ask(&self, question: &str) -> Answer {
        show(question);
        self.wait(None, None)
    }

    /// [`ask`](Self::ask) with a timeout and a cancellation token
    pub fn ask_within(
        &self,
        question: &str,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Answer {
        show(question);
        self.wait(timeout, Some(cancel))
    }

    /// Wait for a line, at most `timeout`, stopping early on cancellation
    pub fn wait(&self, timeout: Option<Duration>, cancel: Option<&CancellationToken>) -> Answer {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Answer::Cancelled;
            }
            let step = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Answer::TimedOut;
                    }
                    left.min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };
            if self.ready(step) {
                return self.read_line();
            }
        }
    }

    /// `(y/N)` question, only `y` accepts
    pub fn confirm(&self, question: &str) -> bool {
        matches!(self.ask(question), Answer::Line(line) if line.trim().eq_ignore_ascii_case("y"))
    }

    #[cfg(unix)]
    fn ready(&self, step: Duration) -> bool {
        match self.fd {
            Some(fd) => readable(fd, step),
            None => true,
        }
    }

    #[cfg(not(unix))]
    fn ready(&self, _step: Duration) -> bool {
        true
    }

    fn read_line(&self) -> Answer {
        let mut line = String::new();
        match self.reader.borrow_mut().read_line(&mut line) {
            Ok(0) | Err(_) => Answer::Closed,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Answer::Line(line)
            }
        }
    }
}

/// Whether `fd` has data or reached EOF within `timeout`
#[cfg(unix)]
fn readable(fd: RawFd, timeout: Duration) -> bool {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: a single valid pollfd that outlives the call
    let ready = unsafe { libc::poll(&mut pollfd, 1, millis) };
    // EINTR (Ctrl-C) lands here too, the caller checks its token
    ready > 0
}

fn show(question: &str) {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{}", question);
    let _ = stdout.flush();
}
