// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drahtdruck — shared error and status-channel definitions for the
// serial print backend.

pub mod error;
pub mod status;

pub use error::{BackendError, Result};
pub use status::StatusChannel;
