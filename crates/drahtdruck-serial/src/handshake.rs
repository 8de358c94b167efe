// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DTR/DSR handshake gate.
//
// Active only for `flow=dtrdsr`. Before a copy starts, the gate polls the
// DSR modem-control line until the peer signals ready. This is best effort,
// not a rendezvous: if the status query itself fails the gate opens rather
// than block forever.

use std::io::Write;
use std::time::Duration;

use tracing::debug;

use drahtdruck_core::status::StatusChannel;

use crate::line::LinePort;

/// Fixed DSR poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Block until the device asserts DSR, polling at [`POLL_INTERVAL`].
///
/// Returns immediately when DSR is already high or the status query fails.
pub fn wait_for_ready<P, W, S>(port: &mut P, status: &mut StatusChannel<W>, mut sleep: S)
where
    P: LinePort + ?Sized,
    W: Write,
    S: FnMut(Duration),
{
    match port.data_set_ready() {
        Ok(true) => return,
        Err(e) => {
            debug!(error = %e, "DSR query failed, proceeding without handshake");
            return;
        }
        Ok(false) => {}
    }

    status.debug("DSR is low; waiting for device...");

    loop {
        sleep(POLL_INTERVAL);
        match port.data_set_ready() {
            Ok(false) => {}
            // Ready, or the query stopped working; either way, go.
            Ok(true) | Err(_) => break,
        }
    }

    status.debug("DSR is high; writing to device...");
}
