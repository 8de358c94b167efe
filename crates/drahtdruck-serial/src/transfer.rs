// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transfer engine: replay the payload to the device, once per copy.
//
// Spooled payloads (a real print file) are rewound between copies and
// announce progress on the status channel: one `PAGE: 1 1` marker per copy
// and a cumulative `INFO:` byte count per chunk. A live stream can only be
// played once, so extra copies are meaningless for it and nothing is
// announced.
//
// A device write may land partially; the remainder is written in further
// calls. One write failure class is transient — ENOTTY from a line
// discipline that momentarily forgot it is a tty — and is retried exactly
// once. Any other write failure aborts the whole transfer, not just the
// chunk: continuing to read after the device stopped accepting data would
// only spin through the rest of the job. The error is reported once, at the
// top level.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::time::Duration;

use tracing::{debug, info};

use drahtdruck_core::error::{BackendError, Result};
use drahtdruck_core::status::StatusChannel;

use crate::handshake;
use crate::line::{LinePort, MAX_CHUNK_SIZE};

/// A print payload. Spooled payloads can be replayed for extra copies.
pub trait Payload: Read {
    /// Seek back to the start for the next copy. Returns `false` when the
    /// source is a live stream that cannot be replayed.
    fn restart(&mut self) -> io::Result<bool>;

    /// Whether this is a spooled file (enables `PAGE:`/`INFO:` notices).
    fn spooled(&self) -> bool;
}

impl Payload for File {
    fn restart(&mut self) -> io::Result<bool> {
        self.seek(SeekFrom::Start(0)).map(|_| true)
    }

    fn spooled(&self) -> bool {
        true
    }
}

impl Payload for io::Stdin {
    fn restart(&mut self) -> io::Result<bool> {
        Ok(false)
    }

    fn spooled(&self) -> bool {
        false
    }
}

impl<T: AsRef<[u8]>> Payload for Cursor<T> {
    fn restart(&mut self) -> io::Result<bool> {
        self.set_position(0);
        Ok(true)
    }

    fn spooled(&self) -> bool {
        true
    }
}

/// Stream the payload to the device, `copies` times.
///
/// `chunk_size` comes from the line configuration and is clamped to the
/// transfer buffer cap. `sleep` is threaded through to the handshake gate.
/// Copies run strictly sequentially; chunks are written in read order.
pub fn send_job<D, P, W, S>(
    payload: &mut D,
    port: &mut P,
    copies: u32,
    chunk_size: usize,
    handshake_gated: bool,
    status: &mut StatusChannel<W>,
    mut sleep: S,
) -> Result<()>
where
    D: Payload + ?Sized,
    P: LinePort + ?Sized,
    W: Write,
    S: FnMut(Duration),
{
    let chunk = chunk_size.clamp(1, MAX_CHUNK_SIZE);
    let mut buffer = vec![0u8; chunk];
    let copies = copies.max(1);

    for copy in 0..copies {
        if payload.spooled() {
            status.page(1, 1);
        }
        if copy > 0 && !payload.restart()? {
            debug!("payload is a live stream; skipping remaining copies");
            break;
        }

        if handshake_gated {
            handshake::wait_for_ready(port, status, &mut sleep);
        }

        let mut total: u64 = 0;
        loop {
            let n = payload.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            write_chunk(port, &buffer[..n])?;
            total += n as u64;
            if payload.spooled() {
                status.info(&format!("Sending print file, {total} bytes..."));
            }
        }

        info!(copy = copy + 1, copies, bytes = total, "copy sent");
    }

    Ok(())
}

/// Write one chunk, absorbing partial writes and a single transient ENOTTY.
fn write_chunk<P: LinePort + ?Sized>(port: &mut P, mut chunk: &[u8]) -> Result<()> {
    while !chunk.is_empty() {
        let attempt = match port.write(chunk) {
            Err(e) if is_transient(&e) => {
                debug!("transient ENOTTY on device write, retrying once");
                port.write(chunk)
            }
            other => other,
        };

        match attempt {
            Ok(0) => {
                return Err(BackendError::Write("device accepted no data".into()));
            }
            Ok(written) => chunk = &chunk[written..],
            Err(e) => return Err(BackendError::Write(e.to_string())),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_transient(e: &io::Error) -> bool {
    e.raw_os_error() == Some(nix::errno::Errno::ENOTTY as i32)
}

#[cfg(not(unix))]
fn is_transient(_e: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted outcome for one `write` call; the script falls back to
    /// accepting everything once exhausted.
    enum WriteStep {
        Accept,
        Partial(usize),
        NotTty,
        Broken,
    }

    struct MockPort {
        script: VecDeque<WriteStep>,
        written: Vec<u8>,
        dsr_queries: u32,
    }

    impl MockPort {
        fn new(script: Vec<WriteStep>) -> Self {
            Self {
                script: script.into(),
                written: Vec::new(),
                dsr_queries: 0,
            }
        }

        fn accepting() -> Self {
            Self::new(Vec::new())
        }
    }

    impl io::Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.script.pop_front().unwrap_or(WriteStep::Accept) {
                WriteStep::Accept => {
                    self.written.extend_from_slice(buf);
                    Ok(buf.len())
                }
                WriteStep::Partial(n) => {
                    let n = n.min(buf.len());
                    self.written.extend_from_slice(&buf[..n]);
                    Ok(n)
                }
                WriteStep::NotTty => {
                    Err(io::Error::from_raw_os_error(nix::errno::Errno::ENOTTY as i32))
                }
                WriteStep::Broken => Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "printer went away",
                )),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LinePort for MockPort {
        fn data_set_ready(&mut self) -> serialport::Result<bool> {
            self.dsr_queries += 1;
            Ok(true)
        }
    }

    fn no_sleep(_: Duration) {}

    fn run(
        payload: &mut impl Payload,
        port: &mut MockPort,
        copies: u32,
        chunk_size: usize,
    ) -> (Result<()>, String) {
        let mut status = StatusChannel::new(Vec::new());
        let result = send_job(
            payload, port, copies, chunk_size, false, &mut status, no_sleep,
        );
        (result, String::from_utf8(status.into_inner()).unwrap())
    }

    #[test]
    fn three_copies_replay_the_whole_payload() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::accepting();
        let (result, notices) = run(&mut payload, &mut port, 3, 480);

        result.unwrap();
        assert_eq!(port.written, b"012345678901234567890123456789");
        assert_eq!(notices.matches("PAGE: 1 1\n").count(), 3);
        assert_eq!(
            notices.matches("INFO: Sending print file, 10 bytes...").count(),
            3
        );
    }

    #[test]
    fn file_payload_rewinds_between_copies() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut port = MockPort::accepting();
        let (result, notices) = run(&mut file, &mut port, 2, 480);

        result.unwrap();
        assert_eq!(port.written, b"01234567890123456789");
        assert_eq!(notices.matches("PAGE: 1 1\n").count(), 2);
    }

    #[test]
    fn progress_counts_are_cumulative_per_chunk() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::accepting();
        let (result, notices) = run(&mut payload, &mut port, 1, 4);

        result.unwrap();
        assert!(notices.contains("INFO: Sending print file, 4 bytes..."));
        assert!(notices.contains("INFO: Sending print file, 8 bytes..."));
        assert!(notices.contains("INFO: Sending print file, 10 bytes..."));
    }

    #[test]
    fn live_stream_announces_nothing_and_plays_once() {
        /// Stdin stand-in: readable, not replayable.
        struct Stream(Cursor<Vec<u8>>);

        impl Read for Stream {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0.read(buf)
            }
        }

        impl Payload for Stream {
            fn restart(&mut self) -> io::Result<bool> {
                Ok(false)
            }
            fn spooled(&self) -> bool {
                false
            }
        }

        let mut payload = Stream(Cursor::new(b"0123456789".to_vec()));
        let mut port = MockPort::accepting();
        let (result, notices) = run(&mut payload, &mut port, 3, 480);

        result.unwrap();
        assert_eq!(port.written, b"0123456789");
        assert!(notices.is_empty());
    }

    #[test]
    fn partial_writes_complete_the_chunk() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::new(vec![WriteStep::Partial(4), WriteStep::Partial(3)]);
        let (result, _) = run(&mut payload, &mut port, 1, 480);

        result.unwrap();
        assert_eq!(port.written, b"0123456789");
    }

    #[test]
    fn single_enotty_is_retried_and_absorbed() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::new(vec![WriteStep::NotTty]);
        let (result, notices) = run(&mut payload, &mut port, 1, 480);

        result.unwrap();
        assert_eq!(port.written, b"0123456789");
        assert!(!notices.contains("ERROR:"));
    }

    #[test]
    fn enotty_twice_in_a_row_is_fatal() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::new(vec![WriteStep::NotTty, WriteStep::NotTty]);
        let (result, _) = run(&mut payload, &mut port, 1, 480);

        assert!(matches!(result, Err(BackendError::Write(_))));
    }

    #[test]
    fn hard_write_failure_aborts_the_transfer() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::new(vec![WriteStep::Broken]);
        let (result, _) = run(&mut payload, &mut port, 3, 480);

        // The whole transfer stops: no later copies, nothing written.
        assert!(matches!(result, Err(BackendError::Write(_))));
        assert!(port.written.is_empty());
    }

    #[test]
    fn handshake_gate_runs_before_every_copy() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::accepting();
        let mut status = StatusChannel::new(Vec::new());

        send_job(&mut payload, &mut port, 3, 480, true, &mut status, no_sleep).unwrap();
        assert_eq!(port.dsr_queries, 3);
    }

    #[test]
    fn zero_copies_degrades_to_one() {
        let mut payload = Cursor::new(*b"0123456789");
        let mut port = MockPort::accepting();
        let (result, _) = run(&mut payload, &mut port, 0, 480);

        result.unwrap();
        assert_eq!(port.written, b"0123456789");
    }
}
