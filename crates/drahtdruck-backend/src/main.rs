// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drahtdruck serial backend.
//
// Entry point implementing the scheduler's invocation contract:
//
//   serial                                        — list candidate devices
//   device-uri job-id user title copies options        — print stdin, 1 copy
//   device-uri job-id user title copies options file   — print file, N copies
//
// The scheduler execs the backend with argv[0] set to the device URI, so
// "argument 0" below really is the address. Exit code 0 means success
// (including an empty discovery run); 1 means usage, open, configuration,
// or write failure, reported as a single `ERROR:` line on the status
// channel.

use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use tracing::info;

use drahtdruck_core::error::{BackendError, Result};
use drahtdruck_core::status::StatusChannel;
use drahtdruck_serial::{
    acquire, list_devices, parse_pairs, send_job, DeviceAddress, LineConfig, TermGuard,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut status = StatusChannel::stderr();

    match run(&args, &mut status) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            status.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// What one invocation is asked to do.
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    /// No job arguments: emit the device listing and exit 0.
    Discover,
    Transfer {
        uri: String,
        copies: u32,
        /// `None` means print stdin (and `copies` is forced to 1).
        file: Option<String>,
    },
}

/// Map the argument vector onto an invocation, or a usage error.
fn classify(args: &[String]) -> Result<Invocation> {
    match args.len() {
        1 => Ok(Invocation::Discover),
        6 | 7 => {
            let file = args.get(6).cloned();
            let copies = match file {
                Some(_) => parse_copies(&args[4]),
                None => 1,
            };
            Ok(Invocation::Transfer {
                uri: args[0].clone(),
                copies,
                file,
            })
        }
        _ => Err(BackendError::Usage),
    }
}

/// Copy count from the scheduler. A count that does not parse, or parses to
/// zero, degrades to a single copy rather than printing nothing.
fn parse_copies(raw: &str) -> u32 {
    raw.parse().ok().filter(|&n| n >= 1).unwrap_or(1)
}

fn run<W: Write>(args: &[String], status: &mut StatusChannel<W>) -> Result<()> {
    match classify(args)? {
        Invocation::Discover => {
            list_devices(&mut std::io::stdout());
            Ok(())
        }
        Invocation::Transfer { uri, copies, file } => {
            transfer(&uri, copies, file.as_deref(), status)
        }
    }
}

fn transfer<W: Write>(
    uri: &str,
    copies: u32,
    file: Option<&str>,
    status: &mut StatusChannel<W>,
) -> Result<()> {
    let address = DeviceAddress::parse(uri)?;
    let config = parse_pairs(&address.raw_options)
        .iter()
        .fold(LineConfig::default(), |c, p| c.with_option(p, status));

    // The handle is held exclusively until it drops at the end of this
    // function, after the last copy.
    let mut port = acquire(&address.path, status)?;
    config.apply(port.as_mut())?;

    // From here on an external stop request must not truncate the job.
    let _guard = TermGuard::arm();

    info!(
        device = %address.path,
        copies,
        chunk = config.chunk_size,
        "starting transfer"
    );

    match file {
        Some(path) => {
            let mut payload = File::open(path)
                .map_err(|e| BackendError::InputOpen(format!("{path}: {e}")))?;
            send_job(
                &mut payload,
                &mut port,
                copies,
                config.chunk_size,
                config.handshake_gated(),
                status,
                std::thread::sleep,
            )
        }
        None => send_job(
            &mut std::io::stdin(),
            &mut port,
            copies,
            config.chunk_size,
            config.handshake_gated(),
            status,
            std::thread::sleep,
        ),
    }
}
