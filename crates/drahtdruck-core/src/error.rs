// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Drahtdruck backend.
//
// Everything here is fatal: the two recoverable conditions (a busy device
// on open, a single ENOTTY on write) are retried where they occur and never
// reach this enum. Whatever does reach it propagates to `main`, is printed
// as one `ERROR:` line on the status channel, and exits the process with
// status 1.

use thiserror::Error;

/// Top-level error type for a backend invocation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Wrong number of command-line arguments.
    #[error("Usage: serial job-id user title copies options [file]")]
    Usage,

    /// The device URI resolved to an empty device path.
    #[error("malformed device address: {0}")]
    MalformedAddress(String),

    /// The named print file could not be opened.
    #[error("unable to open print file: {0}")]
    InputOpen(String),

    /// The serial port could not be opened for a reason other than busy.
    #[error("unable to open serial port device file: {0}")]
    Acquisition(String),

    /// Line attributes could not be applied to the open device.
    #[error("unable to configure serial port: {0}")]
    Configuration(String),

    /// A device write failed with a non-recoverable condition.
    #[error("unable to send print file to printer: {0}")]
    Write(String),

    /// I/O failure reading the payload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BackendError>;
