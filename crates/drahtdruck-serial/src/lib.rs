// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drahtdruck Serial — the transport itself.  This crate takes a device URI
// with embedded transmission options, acquires the line exclusively,
// configures its electrical/framing parameters, and replays the payload to
// it once per requested copy.  The binary crate only wires these pieces
// together.

pub mod acquire;
pub mod discovery;
pub mod guard;
pub mod handshake;
pub mod line;
pub mod options;
pub mod transfer;
pub mod uri;

pub use acquire::acquire;
pub use discovery::{discover, list_devices};
pub use guard::TermGuard;
pub use line::{FlowMode, LineConfig, LinePort, ParityMode};
pub use options::{parse_pairs, OptionPair};
pub use transfer::{send_job, Payload};
pub use uri::DeviceAddress;
