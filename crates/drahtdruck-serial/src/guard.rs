// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shutdown guard.
//
// Once the line is configured and data starts moving, an external stop
// request must not truncate in-flight output — the device may still be
// ejecting or flushing a page. The guard ignores SIGTERM for the remainder
// of the process. There is no restoration step: the effect is scoped to the
// process lifetime of the transfer, which ends right after the job anyway.

use tracing::debug;

/// Process-lifetime SIGTERM suppression, armed between line configuration
/// and the first device write.
pub struct TermGuard(());

impl TermGuard {
    /// Install `SIG_IGN` for SIGTERM. Infallible by design: if the handler
    /// cannot be installed the transfer still proceeds, merely unguarded.
    pub fn arm() -> Self {
        #[cfg(unix)]
        {
            use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

            let ignore =
                SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
            // Safety: installing SIG_IGN carries no handler code that could
            // violate async-signal-safety.
            if let Err(e) = unsafe { sigaction(Signal::SIGTERM, &ignore) } {
                debug!(error = %e, "could not ignore SIGTERM; transfer is unguarded");
            }
        }
        TermGuard(())
    }
}
