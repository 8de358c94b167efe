// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS-style status side channel.
//
// The scheduler that launches a backend reads single-line notices from the
// backend's stderr and routes them into job state: `ERROR:`, `WARNING:`,
// `INFO:`, `DEBUG:` and the `PAGE:` accounting marker. This is an external
// contract, not logging — operator diagnostics go through `tracing`
// instead. The sink is generic so tests can capture notices in a buffer.

use std::io::{self, Write};

/// Severity-tagged single-line notice writer.
///
/// Writes are best effort: a scheduler that has gone away must not turn a
/// progress notice into a job failure, so write errors are swallowed.
pub struct StatusChannel<W: Write> {
    out: W,
}

impl StatusChannel<io::Stderr> {
    /// Status channel on stderr, where the scheduler expects it.
    pub fn stderr() -> Self {
        Self { out: io::stderr() }
    }
}

impl<W: Write> StatusChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn error(&mut self, msg: &str) {
        self.line("ERROR:", msg);
    }

    pub fn warning(&mut self, msg: &str) {
        self.line("WARNING:", msg);
    }

    pub fn info(&mut self, msg: &str) {
        self.line("INFO:", msg);
    }

    pub fn debug(&mut self, msg: &str) {
        self.line("DEBUG:", msg);
    }

    /// Page accounting marker: `PAGE: <page> <copies>`.
    pub fn page(&mut self, page: u32, copies: u32) {
        let _ = writeln!(self.out, "PAGE: {page} {copies}");
    }

    fn line(&mut self, tag: &str, msg: &str) {
        let _ = writeln!(self.out, "{tag} {msg}");
    }

    /// Consume the channel and return the sink. Test helper.
    pub fn into_inner(self) -> W {
        self.out
    }
}
