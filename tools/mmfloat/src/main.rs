//! mmfloat: f32 access to the MMIO window.
//!
//! Usage:
//!   mmfloat encode <num>                        - Print the f32 hex encoding
//!   mmfloat decode <hex>                        - Print the f32 a hex word encodes
//!   mmfloat read <index> [-w]                   - Read one word as a float
//!   mmfloat read_raw <index> [-w]               - Read one word as hex
//!   mmfloat read_range <start> <end> [-w]       - Read words start..end as floats
//!   mmfloat read_raw_range <start> <end> [-w]   - Read words start..end as hex
//!   mmfloat write <index> <num>                 - Write a float, verify the echo
//!   mmfloat write_raw <index> <hex>             - Write a hex word
//!
//! Reads and writes go through the privileged helper and require root.
//! Exit status: 1 not root, 2 helper timeout, 3 helper failure.

mod cli;
mod commands;
mod config;
mod invoker;
mod privilege;
mod verbose;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::invoker::{HelperInvoker, InvokeError};

/// Exit status for failures that are not helper invocation errors.
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Map an error to the process exit status.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<InvokeError>()
        .map_or(EXIT_FAILURE, InvokeError::exit_code)
}

fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Only commands that reach the helper load configuration.
    let config_path = cli.config;
    let port = || -> Result<HelperInvoker> {
        Ok(HelperInvoker::new(Config::load(config_path.as_deref())?))
    };

    match cli.command {
        Command::Encode { num } => commands::encode(&mut out, num),
        Command::Decode { hex_string } => commands::decode(&mut out, &hex_string.join(" ")),
        Command::Read(args) => {
            commands::read(&mut port()?, &mut out, args.index, args.segment.segment())
        }
        Command::ReadRaw(args) => {
            commands::read_raw(&mut port()?, &mut out, args.index, args.segment.segment())
        }
        Command::ReadRange(args) => commands::read_range(
            &mut port()?,
            &mut out,
            args.start,
            args.end,
            args.segment.segment(),
        ),
        Command::ReadRawRange(args) => commands::read_raw_range(
            &mut port()?,
            &mut out,
            args.start,
            args.end,
            args.segment.segment(),
        ),
        Command::Write { index, num } => commands::write(&mut port()?, &mut out, index, num),
        Command::WriteRaw { index, hex_string } => {
            commands::write_raw(&mut port()?, &mut out, index, &hex_string)
        }
    }
}
