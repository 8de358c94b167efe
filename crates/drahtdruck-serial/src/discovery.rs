// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial device discovery.
//
// Invoked when the backend is run with no job arguments: the scheduler
// collects one line per candidate device from stdout, in the form
//
//   serial serial:<path>?baud=115200 "<make>" "<description>"
//
// Enumeration is best effort — a host where it fails simply advertises no
// serial devices; discovery mode always exits successfully.

use std::io::Write;

use serde::Serialize;
use serialport::SerialPortType;
use tracing::{debug, warn};

/// Baud advertised in discovered device URIs; the user dials it down in the
/// queue setup if the device needs less.
const ADVERTISED_BAUD: u32 = 115_200;

/// One candidate print device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    /// Device URI including the advertised baud option.
    pub uri: String,
    /// Manufacturer, or `"Unknown"`.
    pub make: String,
    /// Human-readable port description.
    pub description: String,
}

/// Enumerate candidate serial devices on this host.
pub fn discover() -> Vec<DeviceDescriptor> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!(error = %e, "serial port enumeration failed");
            return Vec::new();
        }
    };

    ports
        .into_iter()
        .enumerate()
        .map(|(i, port)| {
            let (make, product) = match port.port_type {
                SerialPortType::UsbPort(info) => (info.manufacturer, info.product),
                _ => (None, None),
            };
            let descriptor = DeviceDescriptor {
                uri: format!("serial:{}?baud={ADVERTISED_BAUD}", port.port_name),
                make: make.unwrap_or_else(|| "Unknown".to_string()),
                description: product
                    .unwrap_or_else(|| format!("Serial Port #{}", i + 1)),
            };
            debug!(uri = %descriptor.uri, "discovered serial device");
            descriptor
        })
        .collect()
}

/// Print the discovery listing in the scheduler's expected format.
pub fn list_devices<W: Write>(out: &mut W) {
    for device in discover() {
        let _ = writeln!(
            out,
            "serial {} \"{}\" \"{}\"",
            device.uri, device.make, device.description
        );
    }
}
