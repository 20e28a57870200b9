//! Memory word handling for mmfloat.
//!
//! A memory word is four bytes read from or written to the MMIO window. It can
//! be viewed as eight hexadecimal digits or as a big-endian IEEE-754 `f32`.
//! This crate holds the pure parts of the tool: the float/hex codec, the
//! segment address arithmetic and the out-of-range sentinel check.
//!
//! # Usage
//!
//! ```
//! use mmfloat_word::{Segment, address, decode, encode, interpret};
//!
//! assert_eq!(encode(1.0), "3f800000");
//! assert_eq!(decode("0x3F80_0000").unwrap(), 1.0);
//! assert_eq!(address(Segment::Read, 5), 0xA000_0014);
//! assert!(interpret("deadfeed").unwrap().is_nan());
//! ```

#![forbid(unsafe_code)]

pub mod address;
pub mod codec;
pub mod sentinel;

pub use address::{READ_BASE, Segment, WORD_SIZE, WRITE_BASE, address, format_address};
pub use codec::{DecodeError, HEX_DIGITS, decode, encode};
pub use sentinel::{SENTINEL, interpret, is_sentinel};
