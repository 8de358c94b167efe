// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exclusive device acquisition.
//
// A serial line is usually released quickly by a competing job, so a busy
// device is not a failure: the backend announces the wait and retries at a
// fixed interval, forever, with no backoff growth. Every other open error
// is fatal immediately. The open and sleep operations are injected so the
// retry policy can be exercised without a device or a wall clock.

use std::io::{self, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, warn};

use drahtdruck_core::error::{BackendError, Result};
use drahtdruck_core::status::StatusChannel;

/// Fixed wait between attempts on a busy device.
pub const BUSY_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Initial rate handed to the port builder; the real line configuration is
/// overlaid after acquisition.
const OPEN_BAUD: u32 = 9600;

/// Open the serial device exclusively, waiting out contention.
pub fn acquire<W: Write>(
    path: &str,
    status: &mut StatusChannel<W>,
) -> Result<Box<dyn SerialPort>> {
    acquire_with(
        status,
        || serialport::new(path, OPEN_BAUD).open(),
        std::thread::sleep,
    )
    .map_err(|e| {
        warn!(path, error = %e, "serial port acquisition failed");
        e
    })
}

/// Retry-loop core of [`acquire`], generic over the open and sleep
/// operations.
pub fn acquire_with<P, O, S, W>(
    status: &mut StatusChannel<W>,
    mut open: O,
    mut sleep: S,
) -> Result<P>
where
    O: FnMut() -> serialport::Result<P>,
    S: FnMut(Duration),
    W: Write,
{
    loop {
        match open() {
            Ok(port) => return Ok(port),
            Err(e) if is_busy(&e) => {
                debug!("device busy, retrying");
                status.info("Serial port busy; will retry in 30 seconds...");
                sleep(BUSY_RETRY_INTERVAL);
            }
            Err(e) => return Err(BackendError::Acquisition(e.to_string())),
        }
    }
}

/// Whether an open failure means "held by someone else right now".
///
/// EBUSY surfaces as `ResourceBusy`; the description check catches port
/// drivers that report contention under an unmapped errno.
fn is_busy(e: &serialport::Error) -> bool {
    matches!(
        e.kind(),
        serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy)
    ) || e.description.to_ascii_lowercase().contains("busy")
}
