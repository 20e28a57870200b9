//! Out-of-range sentinel detection.
//!
//! The helper answers reads past the end of a segment with the word
//! [`SENTINEL`] instead of failing. Range scans rely on this to keep going,
//! so the check runs on the raw text before any hex validation.

use crate::codec::{DecodeError, decode};

/// Raw payload that marks an out-of-range access.
pub const SENTINEL: &str = "DEADFEED";

/// Returns `true` if `raw` is the sentinel word, ignoring case and surrounding whitespace.
#[must_use]
pub fn is_sentinel(raw: &str) -> bool {
    raw.trim_ascii().eq_ignore_ascii_case(SENTINEL)
}

/// Turn a raw helper payload into a float, mapping the sentinel to NaN.
///
/// # Errors
///
/// Any non-sentinel payload is decoded and a [`DecodeError`] is returned
/// unchanged; a malformed word from the helper is never silently dropped.
pub fn interpret(raw: &str) -> Result<f64, DecodeError> {
    if is_sentinel(raw) {
        return Ok(f64::NAN);
    }
    decode(raw)
}
