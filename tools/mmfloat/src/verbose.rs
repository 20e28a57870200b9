//! Stderr diagnostics for mmfloat.
//!
//! `-q` keeps stderr to errors only, `-v` adds the helper command line and
//! how long each helper call took. Results always go to stdout.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

const QUIET: u8 = 0;
const NORMAL: u8 = 1;
const VERBOSE: u8 = 2;

static LEVEL: AtomicU8 = AtomicU8::new(NORMAL);

fn level_for(quiet: bool, verbose: bool) -> u8 {
    match (quiet, verbose) {
        (true, _) => QUIET,
        (false, true) => VERBOSE,
        (false, false) => NORMAL,
    }
}

/// Set the diagnostic level from the `-q`/`-v` flags.
pub fn init(quiet: bool, verbose: bool) {
    LEVEL.store(level_for(quiet, verbose), Ordering::Relaxed);
}

/// Whether `-v` was given.
pub fn is_verbose() -> bool {
    LEVEL.load(Ordering::Relaxed) == VERBOSE
}

/// Whether `-q` was given.
pub fn is_quiet() -> bool {
    LEVEL.load(Ordering::Relaxed) == QUIET
}

/// `eprintln!` under `-v`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `eprintln!` unless `-q`; used for notices such as out-of-range words.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Reports the duration of one helper call under `-v` when dropped.
pub struct Timer {
    address: String,
    start: Instant,
}

impl Timer {
    /// Start timing the helper call for `address`.
    pub fn start(address: &str) -> Self {
        Self {
            address: address.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            eprintln!("  helper {}: {:.1?}", self.address, self.start.elapsed());
        }
    }
}
