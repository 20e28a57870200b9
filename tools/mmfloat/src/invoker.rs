//! Privileged helper invocation.
//!
//! Each word access runs the helper once as
//! `<elevate> <helper> <address> [<value>]`, with stdout and stderr captured
//! separately and the whole call bounded by the configured timeout. The
//! helper prints the word it read (or the word now stored, for writes) as
//! hex on stdout.

use std::fmt;
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mmfloat_word::format_address;

use crate::config::Config;
use crate::privilege;
use crate::verbose::{Timer, vprintln};

/// How often a running helper is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output readers get to reach EOF once the helper has exited or
/// been killed. A grandchild can keep the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Exit status when the process is not running as root.
pub const EXIT_PRIVILEGE: u8 = 1;
/// Exit status when the helper exceeded its timeout.
pub const EXIT_TIMEOUT: u8 = 2;
/// Exit status when the helper failed or could not be started.
pub const EXIT_HELPER: u8 = 3;

/// Access to single memory words by absolute address.
///
/// Both methods return the raw word text reported back, normalized to
/// uppercase. Interpreting it (sentinel, float) is up to the caller.
pub trait WordPort {
    /// Read the word at `address`.
    fn read_word(&mut self, address: u64) -> Result<String, InvokeError>;

    /// Write the hex word `value` to `address` and return the echoed word.
    fn write_word(&mut self, address: u64, value: &str) -> Result<String, InvokeError>;
}

/// Failures of a single helper invocation.
#[derive(Debug)]
pub enum InvokeError {
    /// The process is not running as root; nothing was spawned.
    InsufficientPrivilege,
    /// The helper could not be started or waited on.
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The helper did not finish within the timeout and was killed.
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
        /// Whatever the helper wrote to stderr before it was killed.
        stderr: String,
    },
    /// The helper exited unsuccessfully.
    HelperError {
        /// Exit code, or `None` if the helper was killed by a signal.
        code: Option<i32>,
        /// The helper's stderr.
        stderr: String,
    },
}

impl InvokeError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InsufficientPrivilege => EXIT_PRIVILEGE,
            Self::Timeout { .. } => EXIT_TIMEOUT,
            Self::Launch { .. } | Self::HelperError { .. } => EXIT_HELPER,
        }
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPrivilege => {
                write!(f, "insufficient privilege: must run as root, re-run with sudo")
            }
            Self::Launch { program, source } => write!(f, "failed to run `{program}`: {source}"),
            Self::Timeout { timeout, stderr } => {
                write!(f, "helper timed out after {timeout:?}")?;
                write_diagnostics(f, stderr)
            }
            Self::HelperError { code, stderr } => {
                match code {
                    Some(code) => write!(f, "helper exited with status {code}")?,
                    None => write!(f, "helper was terminated by a signal")?,
                }
                write_diagnostics(f, stderr)
            }
        }
    }
}

fn write_diagnostics(f: &mut fmt::Formatter<'_>, stderr: &str) -> fmt::Result {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        Ok(())
    } else {
        write!(f, "\n{stderr}")
    }
}

impl std::error::Error for InvokeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Launch { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// [`WordPort`] backed by the external helper program.
pub struct HelperInvoker {
    config: Config,
    privileged: fn() -> bool,
}

impl HelperInvoker {
    /// Create an invoker that checks for root before every call.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            privileged: privilege::is_root,
        }
    }

    /// Replace the privilege check.
    #[cfg(test)]
    fn with_privilege_check(mut self, check: fn() -> bool) -> Self {
        self.privileged = check;
        self
    }

    /// Run the helper once for `address`, passing `value` for writes.
    ///
    /// Returns the helper's stdout, trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// See [`InvokeError`]. The privilege check runs before anything is spawned.
    pub fn invoke(&self, address: u64, value: Option<&str>) -> Result<String, InvokeError> {
        if !(self.privileged)() {
            return Err(InvokeError::InsufficientPrivilege);
        }

        let address = format_address(address);
        let mut argv: Vec<&str> = Vec::with_capacity(4);
        if let Some(ref elevate) = self.config.elevate {
            argv.push(elevate);
        }
        argv.push(&self.config.helper);
        argv.push(&address);
        if let Some(value) = value {
            argv.push(value);
        }

        vprintln!("invoking: {}", argv.join(" "));
        let _t = Timer::start(&address);

        let program = argv[0];
        let mut child = Command::new(program)
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Launch {
                program: program.to_string(),
                source,
            })?;

        let stdout = Capture::start(child.stdout.take());
        let stderr = Capture::start(child.stderr.take());

        let Some(status) = wait_with_timeout(&mut child, self.config.timeout, program)? else {
            return Err(InvokeError::Timeout {
                timeout: self.config.timeout,
                stderr: stderr.finish_within(DRAIN_GRACE),
            });
        };

        let stdout = stdout.finish_within(DRAIN_GRACE);
        let stderr = stderr.finish_within(DRAIN_GRACE);
        if !status.success() {
            return Err(InvokeError::HelperError {
                code: status.code(),
                stderr,
            });
        }

        Ok(stdout.trim().to_ascii_uppercase())
    }
}

impl WordPort for HelperInvoker {
    fn read_word(&mut self, address: u64) -> Result<String, InvokeError> {
        self.invoke(address, None)
    }

    fn write_word(&mut self, address: u64, value: &str) -> Result<String, InvokeError> {
        self.invoke(address, Some(value))
    }
}

/// Wait for `child` to exit, killing it once `timeout` has elapsed.
///
/// Returns `None` if the child was killed.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    program: &str,
) -> Result<Option<ExitStatus>, InvokeError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvokeError::Launch {
                    program: program.to_string(),
                    source,
                });
            }
        }

        if started.elapsed() >= timeout {
            vprintln!("helper exceeded {timeout:?}, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Background reader collecting one output stream of the helper.
///
/// Bytes are appended as they arrive so a partial capture is available
/// even if the stream never reaches EOF.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(source: Option<R>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let reader = source.map(|mut source| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let mut chunk = [0u8; 512];
                loop {
                    match source.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => buf
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(_) => break,
                    }
                }
            })
        });
        Self { buf, reader }
    }

    /// Return what has been read once EOF is reached or `grace` runs out.
    ///
    /// A reader still blocked after `grace` is left detached.
    fn finish_within(self, grace: Duration) -> String {
        let deadline = Instant::now() + grace;
        if let Some(ref reader) = self.reader {
            while !reader.is_finished() && Instant::now() < deadline {
                thread::sleep(POLL_INTERVAL);
            }
        }
        self.contents()
    }

    fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
