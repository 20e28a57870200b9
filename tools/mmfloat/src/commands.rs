//! User-facing operations.
//!
//! Each command composes the word codec, the segment addressing and a
//! [`WordPort`], and writes its result lines to `out`.

use std::io::Write;

use anyhow::{Context, Result};
use mmfloat_word::{Segment, address, decode as decode_word, encode as encode_word};
use mmfloat_word::{interpret, is_sentinel};

use crate::config::WRITE_TOLERANCE;
use crate::invoker::WordPort;
use crate::verbose::dprintln;

/// Render a float the way results are printed: shortest round-trip form
/// with a decimal point, `NaN` and `inf` for the specials.
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// Print the hex encoding of `num`.
pub fn encode(out: &mut impl Write, num: f64) -> Result<()> {
    writeln!(out, "{}", encode_word(num))?;
    Ok(())
}

/// Print the float encoded by `hex`.
pub fn decode(out: &mut impl Write, hex: &str) -> Result<()> {
    let value = decode_word(hex).with_context(|| format!("cannot decode {hex:?}"))?;
    writeln!(out, "{}", format_value(value))?;
    Ok(())
}

/// Read word `index` and turn it into a float, mapping the sentinel to NaN.
fn read_value(port: &mut impl WordPort, index: u32, segment: Segment) -> Result<f64> {
    let raw = port.read_word(address(segment, index))?;
    if is_sentinel(&raw) {
        dprintln!("note: {segment} word {index} is out of range");
    }
    interpret(&raw).with_context(|| {
        format!("helper returned a malformed word {raw:?} for {segment} word {index}")
    })
}

/// Print word `index` of `segment` as a float.
pub fn read(
    port: &mut impl WordPort,
    out: &mut impl Write,
    index: u32,
    segment: Segment,
) -> Result<()> {
    let value = read_value(port, index, segment)?;
    writeln!(out, "{}", format_value(value))?;
    Ok(())
}

/// Print word `index` of `segment` exactly as the helper reported it.
pub fn read_raw(
    port: &mut impl WordPort,
    out: &mut impl Write,
    index: u32,
    segment: Segment,
) -> Result<()> {
    let raw = port.read_word(address(segment, index))?;
    writeln!(out, "{raw}")?;
    Ok(())
}

/// Print words `start..end` of `segment` as floats, one labelled line each.
///
/// Out-of-range words print as NaN and the scan continues; any helper
/// failure aborts the scan.
pub fn read_range(
    port: &mut impl WordPort,
    out: &mut impl Write,
    start: u32,
    end: u32,
    segment: Segment,
) -> Result<()> {
    for index in start..end {
        let value = read_value(port, index, segment)?;
        writeln!(out, "{index:<2}: {}", format_value(value))?;
    }
    Ok(())
}

/// Print words `start..end` of `segment` as raw hex, one labelled line each.
pub fn read_raw_range(
    port: &mut impl WordPort,
    out: &mut impl Write,
    start: u32,
    end: u32,
    segment: Segment,
) -> Result<()> {
    for index in start..end {
        let raw = port.read_word(address(segment, index))?;
        writeln!(out, "{index:<2}: {raw}")?;
    }
    Ok(())
}

/// Write `num` to word `index` of the write segment and check the echo.
///
/// A written value further than [`WRITE_TOLERANCE`] from `num` is reported,
/// not treated as an error.
pub fn write(port: &mut impl WordPort, out: &mut impl Write, index: u32, num: f64) -> Result<()> {
    let echoed = port.write_word(address(Segment::Write, index), &encode_word(num))?;
    let written = interpret(&echoed)
        .with_context(|| format!("helper echoed a malformed word {echoed:?}"))?;

    if (written - num).abs() <= WRITE_TOLERANCE {
        writeln!(out, "Success!")?;
    } else {
        writeln!(out, "Warning: value written was {}", format_value(written))?;
    }
    Ok(())
}

/// Write the literal word `hex` to word `index` of the write segment.
pub fn write_raw(
    port: &mut impl WordPort,
    out: &mut impl Write,
    index: u32,
    hex: &str,
) -> Result<()> {
    let echoed = port.write_word(address(Segment::Write, index), hex)?;
    writeln!(out, "0X{echoed}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::InvokeError;
    use mmfloat_word::{DecodeError, READ_BASE, WRITE_BASE};
    use std::collections::BTreeMap;

    /// In-memory word store; unmapped addresses read as the sentinel.
    #[derive(Default)]
    struct FakePort {
        words: BTreeMap<u64, String>,
        /// Forces every write to store this word instead of the requested one.
        write_override: Option<String>,
        /// Address whose access fails with a helper error.
        failing: Option<u64>,
        calls: Vec<(u64, Option<String>)>,
    }

    impl FakePort {
        fn with_words(base: u64, words: &[&str]) -> Self {
            let mut port = Self::default();
            for (i, w) in (0u64..).zip(words) {
                port.words.insert(base + 4 * i, (*w).to_string());
            }
            port
        }

        fn check(&self, address: u64) -> Result<(), InvokeError> {
            if self.failing == Some(address) {
                return Err(InvokeError::HelperError {
                    code: Some(1),
                    stderr: "bus error".into(),
                });
            }
            Ok(())
        }
    }

    impl WordPort for FakePort {
        fn read_word(&mut self, address: u64) -> Result<String, InvokeError> {
            self.calls.push((address, None));
            self.check(address)?;
            Ok(self
                .words
                .get(&address)
                .cloned()
                .unwrap_or_else(|| "DEADFEED".into()))
        }

        fn write_word(&mut self, address: u64, value: &str) -> Result<String, InvokeError> {
            self.calls.push((address, Some(value.to_string())));
            self.check(address)?;
            let stored = self
                .write_override
                .clone()
                .unwrap_or_else(|| value.to_ascii_uppercase());
            self.words.insert(address, stored.clone());
            Ok(stored)
        }
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out: Vec<u8> = Vec::new();
        run(&mut out).expect("command failed");
        String::from_utf8(out).expect("non-UTF-8 output")
    }

    // -----------------------------------------------------------------------
    // encode / decode
    // -----------------------------------------------------------------------

    #[test]
    fn encode_prints_lowercase_hex() {
        assert_eq!(output(|o| encode(o, 1.0)), "3f800000\n");
        assert_eq!(output(|o| encode(o, -0.0)), "80000000\n");
    }

    #[test]
    fn decode_prints_float() {
        assert_eq!(output(|o| decode(o, "3f800000")), "1.0\n");
        assert_eq!(output(|o| decode(o, "0x 3F_80_00_00")), "1.0\n");
        assert_eq!(output(|o| decode(o, "3dcccccd")), "0.10000000149011612\n");
    }

    #[test]
    fn decode_failure_keeps_decode_error() {
        let err = decode(&mut Vec::<u8>::new(), "ZZZZZZZZ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::InvalidCharacter { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // read / read_raw
    // -----------------------------------------------------------------------

    #[test]
    fn read_uses_segment_address() {
        let mut port = FakePort::with_words(WRITE_BASE, &["00000000", "C0200000"]);
        let text = output(|o| read(&mut port, o, 1, Segment::Write));
        assert_eq!(text, "-2.5\n");
        assert_eq!(port.calls, vec![(WRITE_BASE + 4, None)]);
    }

    #[test]
    fn read_maps_sentinel_to_nan() {
        let mut port = FakePort::default();
        assert_eq!(output(|o| read(&mut port, o, 9, Segment::Read)), "NaN\n");
    }

    #[test]
    fn read_raw_prints_payload_unmodified() {
        let mut port = FakePort::with_words(READ_BASE, &["3F800000"]);
        assert_eq!(output(|o| read_raw(&mut port, o, 0, Segment::Read)), "3F800000\n");
        assert_eq!(output(|o| read_raw(&mut port, o, 1, Segment::Read)), "DEADFEED\n");
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut port = FakePort::with_words(READ_BASE, &["3F80"]);
        let err = read(&mut port, &mut Vec::<u8>::new(), 0, Segment::Read).unwrap_err();
        assert!(err.downcast_ref::<DecodeError>().is_some(), "unexpected error: {err}");
    }

    // -----------------------------------------------------------------------
    // ranges
    // -----------------------------------------------------------------------

    #[test]
    fn read_range_labels_each_index_and_continues_past_sentinel() {
        let mut port = FakePort::with_words(READ_BASE, &["3F800000", "40000000"]);
        let text = output(|o| read_range(&mut port, o, 0, 4, Segment::Read));
        assert_eq!(text, "0 : 1.0\n1 : 2.0\n2 : NaN\n3 : NaN\n");
        let addresses: Vec<u64> = port.calls.iter().map(|(a, _)| *a).collect();
        assert_eq!(
            addresses,
            vec![READ_BASE, READ_BASE + 4, READ_BASE + 8, READ_BASE + 12]
        );
    }

    #[test]
    fn range_labels_wider_than_two_digits_are_not_truncated() {
        let mut port = FakePort::default();
        let text = output(|o| read_raw_range(&mut port, o, 99, 101, Segment::Write));
        assert_eq!(text, "99: DEADFEED\n100: DEADFEED\n");
    }

    #[test]
    fn empty_range_invokes_nothing() {
        let mut port = FakePort::default();
        assert_eq!(output(|o| read_range(&mut port, o, 5, 5, Segment::Read)), "");
        assert_eq!(output(|o| read_raw_range(&mut port, o, 6, 2, Segment::Read)), "");
        assert!(port.calls.is_empty());
    }

    #[test]
    fn helper_failure_aborts_range() {
        let mut port = FakePort::with_words(READ_BASE, &["3F800000", "3F800000", "3F800000"]);
        port.failing = Some(READ_BASE + 4);
        let mut out: Vec<u8> = Vec::new();
        let err = read_range(&mut port, &mut out, 0, 3, Segment::Read).unwrap_err();

        assert_eq!(String::from_utf8(out).unwrap(), "0 : 1.0\n");
        assert_eq!(port.calls.len(), 2);
        let invoke = err.downcast_ref::<InvokeError>().expect("invoke error");
        assert_eq!(invoke.exit_code(), 3);
    }

    // -----------------------------------------------------------------------
    // write / write_raw
    // -----------------------------------------------------------------------

    #[test]
    fn write_sends_encoded_value_to_write_segment() {
        let mut port = FakePort::default();
        assert_eq!(output(|o| write(&mut port, o, 2, 1.0)), "Success!\n");
        assert_eq!(port.calls, vec![(WRITE_BASE + 8, Some("3f800000".into()))]);
    }

    #[test]
    fn write_within_tolerance_is_success() {
        // 0.1 is not exact in f32 but the echo is well within tolerance.
        let mut port = FakePort::default();
        assert_eq!(output(|o| write(&mut port, o, 0, 0.1)), "Success!\n");
    }

    #[test]
    fn write_discrepancy_reports_written_value() {
        let mut port = FakePort {
            write_override: Some("40000000".into()),
            ..FakePort::default()
        };
        assert_eq!(
            output(|o| write(&mut port, o, 0, 1.0)),
            "Warning: value written was 2.0\n"
        );
    }

    #[test]
    fn write_out_of_range_reports_nan() {
        let mut port = FakePort {
            write_override: Some("DEADFEED".into()),
            ..FakePort::default()
        };
        assert_eq!(
            output(|o| write(&mut port, o, 4096, 1.0)),
            "Warning: value written was NaN\n"
        );
    }

    #[test]
    fn write_raw_forwards_literal_and_prefixes_echo() {
        let mut port = FakePort::default();
        assert_eq!(output(|o| write_raw(&mut port, o, 1, "c0200000")), "0XC0200000\n");
        assert_eq!(port.calls, vec![(WRITE_BASE + 4, Some("c0200000".into()))]);
    }
}
