// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device URI resolution.
//
// A backend is handed a device URI of the form `scheme:path[?options]`
// (typically `serial:/dev/ttyS0?baud=19200+parity=even`). The resolver
// splits it into the bare device path and the raw option string; option
// *decoding* lives in `options.rs`.

use drahtdruck_core::error::{BackendError, Result};

/// A resolved device address: scheme, bare device path, raw option string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub scheme: String,
    pub path: String,
    pub raw_options: String,
}

impl DeviceAddress {
    /// Split a device URI into scheme, device path, and raw options.
    ///
    /// Everything after the first `?` is the option string.  An authority
    /// segment (`scheme://host/...`) is stripped off like any generic URI
    /// split would; serial URIs normally have none.  An empty device path
    /// is a malformed address.
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = match uri.split_once(':') {
            Some((s, r)) => (s, r),
            None => ("", uri),
        };

        // Strip `//authority`; the path keeps its leading slash.
        let rest = match rest.strip_prefix("//") {
            Some(after) => match after.find('/') {
                Some(idx) => &after[idx..],
                None => "",
            },
            None => rest,
        };

        let (path, raw_options) = match rest.split_once('?') {
            Some((p, o)) => (p, o),
            None => (rest, ""),
        };

        if path.is_empty() {
            return Err(BackendError::MalformedAddress(format!(
                "no device path in \"{uri}\""
            )));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
            raw_options: raw_options.to_string(),
        })
    }
}
