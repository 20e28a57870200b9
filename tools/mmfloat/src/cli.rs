//! Command-line interface definitions for mmfloat.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mmfloat_word::Segment;

/// Read and write f32 words in the MMIO window through a privileged helper.
#[derive(Parser)]
#[command(name = "mmfloat", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file overriding how the helper is launched (default: built-in settings).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress notices; print only results and errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log helper invocations and timings to stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the big-endian f32 hex encoding of a number.
    #[command(allow_negative_numbers = true)]
    Encode {
        /// Number to encode.
        num: f64,
    },
    /// Print the f32 value encoded by 8 hex digits.
    Decode {
        /// Hex word; separators, `_` and a `0x` prefix are ignored.
        #[arg(required = true, num_args = 1..)]
        hex_string: Vec<String>,
    },
    /// Read one word and print it as a float.
    Read(ReadArgs),
    /// Read one word and print the raw hex.
    #[command(name = "read_raw", alias = "read-raw")]
    ReadRaw(ReadArgs),
    /// Read words `start..end` and print them as floats.
    #[command(name = "read_range", alias = "read-range")]
    ReadRange(RangeArgs),
    /// Read words `start..end` and print the raw hex.
    #[command(name = "read_raw_range", alias = "read-raw-range")]
    ReadRawRange(RangeArgs),
    /// Write a float to a word in the write segment.
    #[command(allow_negative_numbers = true)]
    Write {
        /// Word index in the write segment.
        index: u32,
        /// Value to write.
        num: f64,
    },
    /// Write a literal hex word to the write segment.
    #[command(name = "write_raw", alias = "write-raw")]
    WriteRaw {
        /// Word index in the write segment.
        index: u32,
        /// Hex word passed to the helper unchanged.
        hex_string: String,
    },
}

/// Segment selection shared by the read commands.
#[derive(Args)]
pub struct SegmentArgs {
    /// Address the write segment instead of the read segment.
    #[arg(long = "write-segment", short = 'w')]
    pub write_segment: bool,
}

impl SegmentArgs {
    /// The selected segment.
    pub fn segment(&self) -> Segment {
        if self.write_segment {
            Segment::Write
        } else {
            Segment::Read
        }
    }
}

/// Arguments for `read` and `read_raw`.
#[derive(Args)]
pub struct ReadArgs {
    /// Word index.
    pub index: u32,

    #[command(flatten)]
    pub segment: SegmentArgs,
}

/// Arguments for `read_range` and `read_raw_range`.
#[derive(Args)]
pub struct RangeArgs {
    /// First word index.
    pub start: u32,

    /// One past the last word index.
    pub end: u32,

    #[command(flatten)]
    pub segment: SegmentArgs,
}
