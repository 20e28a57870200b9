//! Conversion between `f32` words and their big-endian hex text.

use std::collections::BTreeSet;
use std::fmt;

/// Number of hex digits in one encoded word.
pub const HEX_DIGITS: usize = 8;

/// Errors produced when decoding a hex word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The cleaned input does not have exactly [`HEX_DIGITS`] characters.
    InvalidLength {
        /// The cleaned input that was rejected.
        input: String,
    },
    /// The cleaned input contains characters outside `[0-9a-fA-F]`.
    InvalidCharacter {
        /// Every distinct offending character, sorted.
        chars: BTreeSet<char>,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { input } => write!(
                f,
                "invalid length: expected {HEX_DIGITS} hex digits, got {} in {input:?}",
                input.chars().count()
            ),
            Self::InvalidCharacter { chars } => {
                write!(f, "invalid hex character(s): {{")?;
                for (i, c) in chars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Encode `value` as a big-endian `f32`, rendered as 8 lowercase hex digits.
///
/// The value is narrowed with an `as` cast, so out-of-range magnitudes
/// become infinities and excess precision is rounded away.
#[must_use]
#[expect(clippy::cast_possible_truncation, reason = "narrowing to f32 is the encoding")]
pub fn encode(value: f64) -> String {
    (value as f32)
        .to_be_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a hex word into the `f32` it encodes, widened to `f64`.
///
/// ASCII whitespace and `_` separators are ignored anywhere in the input, and a
/// single leading `0x`/`0X` is removed. Leading zeros are kept.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidLength`] unless exactly [`HEX_DIGITS`]
/// characters remain, and [`DecodeError::InvalidCharacter`] if any of them
/// is not a hex digit.
pub fn decode(raw: &str) -> Result<f64, DecodeError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != '_')
        .collect();
    let digits = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);

    if digits.chars().count() != HEX_DIGITS {
        return Err(DecodeError::InvalidLength {
            input: digits.to_string(),
        });
    }

    let bad: BTreeSet<char> = digits.chars().filter(|c| !c.is_ascii_hexdigit()).collect();
    if !bad.is_empty() {
        return Err(DecodeError::InvalidCharacter { chars: bad });
    }

    let bits = digits
        .chars()
        .filter_map(|c| c.to_digit(16))
        .fold(0u32, |acc, nibble| (acc << 4) | nibble);
    Ok(f64::from(f32::from_bits(bits)))
}
