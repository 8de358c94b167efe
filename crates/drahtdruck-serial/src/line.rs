// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line configuration: the electrical/framing parameters of the serial line
// and their application to an open device.
//
// Options are folded into a `LineConfig` one pair at a time, last write
// wins; the folded record is then applied to the acquired port in one go.
// `chunk_size` is derived state: it tracks the accepted baud rate so that a
// transfer feeds the line roughly twice per second.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort};
use tracing::debug;

use drahtdruck_core::error::{BackendError, Result};
use drahtdruck_core::status::StatusChannel;

use crate::options::OptionPair;

/// Default transfer chunk: 9600 baud / 10 bits per char / 2 Hz.
pub const DEFAULT_CHUNK_SIZE: usize = 480;

/// Hard upper bound on the transfer buffer, independent of baud.
pub const MAX_CHUNK_SIZE: usize = 8192;

/// Discrete baud rates the backend accepts.
const SUPPORTED_BAUD: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Parity mode of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityMode {
    None,
    Even,
    Odd,
}

/// Flow-control mode of the line.
///
/// `DtrDsr` is not an in-band or RTS/CTS discipline the line driver can
/// enforce; it arms the handshake gate instead and leaves the driver-level
/// flow control off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    None,
    Soft,
    Hard,
    DtrDsr,
}

/// Declarative serial line configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Baud rate; `None` keeps whatever the device is currently set to.
    pub baud: Option<u32>,
    /// Data bits per character: 7 or 8.
    pub data_bits: u8,
    pub parity: ParityMode,
    pub flow: FlowMode,
    /// Transfer chunk size in bytes, derived from the baud rate.
    pub chunk_size: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud: None,
            data_bits: 8,
            parity: ParityMode::None,
            flow: FlowMode::None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl LineConfig {
    /// Fold one decoded option into the configuration.
    ///
    /// Unknown *values* for a recognized name warn on the status channel and
    /// leave the previous setting intact; unknown *names* are ignored for
    /// forward compatibility.
    pub fn with_option<W: Write>(
        mut self,
        pair: &OptionPair,
        status: &mut StatusChannel<W>,
    ) -> Self {
        let value = pair.value.as_str();
        match pair.name.as_str() {
            "baud" => match value.parse::<u32>() {
                Ok(rate) if SUPPORTED_BAUD.contains(&rate) => {
                    self.baud = Some(rate);
                    self.chunk_size = (rate as usize / 20).min(MAX_CHUNK_SIZE);
                }
                _ => status.warning(&format!("Unsupported baud rate {value}!")),
            },
            "bits" => match value {
                "7" => {
                    self.data_bits = 7;
                    // 7-bit lines always frame with parity.
                    self.parity = ParityMode::Even;
                }
                "8" => {
                    self.data_bits = 8;
                    self.parity = ParityMode::None;
                }
                _ => status.warning(&format!("Unsupported data bit count {value}!")),
            },
            "parity" => {
                if value.eq_ignore_ascii_case("even") {
                    self.parity = ParityMode::Even;
                } else if value.eq_ignore_ascii_case("odd") {
                    self.parity = ParityMode::Odd;
                } else if value.eq_ignore_ascii_case("none") {
                    self.parity = ParityMode::None;
                } else {
                    status.warning(&format!("Unsupported parity mode {value}!"));
                }
            }
            "flow" => {
                if value.eq_ignore_ascii_case("none") {
                    self.flow = FlowMode::None;
                } else if value.eq_ignore_ascii_case("soft") {
                    self.flow = FlowMode::Soft;
                } else if value.eq_ignore_ascii_case("hard")
                    || value.eq_ignore_ascii_case("rtscts")
                {
                    self.flow = FlowMode::Hard;
                } else if value.eq_ignore_ascii_case("dtrdsr") {
                    self.flow = FlowMode::DtrDsr;
                } else {
                    status.warning(&format!("Unsupported flow control {value}!"));
                }
            }
            other => debug!(option = other, "ignoring unrecognized device option"),
        }
        self
    }

    /// Whether the transfer must wait for DSR before each copy.
    pub fn handshake_gated(&self) -> bool {
        self.flow == FlowMode::DtrDsr
    }

    /// Apply the configuration to the acquired device.
    ///
    /// Raw byte-stream mode (no canonical processing, no echo, no signal
    /// generation) is part of the port driver's open contract; only the
    /// declarative fields are overlaid here. Any failure is fatal for the
    /// invocation.
    pub fn apply(&self, port: &mut dyn SerialPort) -> Result<()> {
        if let Some(rate) = self.baud {
            port.set_baud_rate(rate).map_err(config_error)?;
        }
        let bits = match self.data_bits {
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        port.set_data_bits(bits).map_err(config_error)?;

        let parity = match self.parity {
            ParityMode::None => Parity::None,
            ParityMode::Even => Parity::Even,
            ParityMode::Odd => Parity::Odd,
        };
        port.set_parity(parity).map_err(config_error)?;

        let flow = match self.flow {
            FlowMode::Soft => FlowControl::Software,
            FlowMode::Hard => FlowControl::Hardware,
            // DSR readiness is polled by the handshake gate.
            FlowMode::None | FlowMode::DtrDsr => FlowControl::None,
        };
        port.set_flow_control(flow).map_err(config_error)?;

        debug!(baud = ?self.baud, bits = self.data_bits, "line configuration applied");
        Ok(())
    }
}

fn config_error(e: serialport::Error) -> BackendError {
    BackendError::Configuration(e.to_string())
}

/// The device seam shared by the handshake gate and the transfer engine:
/// a byte sink that can also report the peer's ready signal.
pub trait LinePort: io::Write {
    /// Current state of the DSR modem-control line.
    fn data_set_ready(&mut self) -> serialport::Result<bool>;
}

impl LinePort for Box<dyn SerialPort> {
    fn data_set_ready(&mut self) -> serialport::Result<bool> {
        self.read_data_set_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::parse_pairs;

    fn fold(raw: &str) -> (LineConfig, String) {
        let mut status = StatusChannel::new(Vec::new());
        let config = parse_pairs(raw)
            .iter()
            .fold(LineConfig::default(), |c, p| c.with_option(p, &mut status));
        (config, String::from_utf8(status.into_inner()).unwrap())
    }

    #[test]
    fn defaults_assume_9600_baud() {
        let config = LineConfig::default();
        assert_eq!(config.baud, None);
        assert_eq!(config.chunk_size, 480);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.parity, ParityMode::None);
        assert_eq!(config.flow, FlowMode::None);
    }

    #[test]
    fn baud_recomputes_chunk_size() {
        let (config, _) = fold("baud=19200");
        assert_eq!(config.baud, Some(19200));
        assert_eq!(config.chunk_size, 960);
    }

    #[test]
    fn chunk_size_never_exceeds_buffer_cap() {
        // 115200/20 = 5760 fits; the cap matters only if the supported set
        // ever grows, but the clamp is part of the contract.
        let (config, _) = fold("baud=115200");
        assert!(config.chunk_size <= MAX_CHUNK_SIZE);
        assert_eq!(config.chunk_size, 5760);
    }

    #[test]
    fn unsupported_baud_warns_and_keeps_previous() {
        let (config, warnings) = fold("baud=9600+baud=31337");
        assert_eq!(config.baud, Some(9600));
        assert_eq!(config.chunk_size, 480);
        assert!(warnings.contains("WARNING: Unsupported baud rate 31337!"));
    }

    #[test]
    fn seven_bits_forces_even_parity() {
        let (config, _) = fold("bits=7");
        assert_eq!(config.data_bits, 7);
        assert_eq!(config.parity, ParityMode::Even);
    }

    #[test]
    fn explicit_parity_after_bits_wins() {
        let (config, _) = fold("baud=9600+bits=7+parity=none");
        assert_eq!(config.data_bits, 7);
        assert_eq!(config.parity, ParityMode::None);
    }

    #[test]
    fn bits_after_parity_overrides_it() {
        let (config, _) = fold("parity=odd+bits=8");
        assert_eq!(config.parity, ParityMode::None);
    }

    #[test]
    fn rtscts_is_an_alias_for_hard() {
        let (config, _) = fold("flow=rtscts");
        assert_eq!(config.flow, FlowMode::Hard);
        assert!(!config.handshake_gated());
    }

    #[test]
    fn dtrdsr_arms_the_handshake_gate() {
        let (config, _) = fold("flow=DTRDSR");
        assert_eq!(config.flow, FlowMode::DtrDsr);
        assert!(config.handshake_gated());
    }

    #[test]
    fn unknown_names_are_silently_ignored() {
        let (config, warnings) = fold("shininess=11+baud=9600");
        assert_eq!(config.baud, Some(9600));
        assert!(warnings.is_empty());
    }
}
