use std::io::{Read, Write};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use zdt_types::Error;

use crate::frame::SlcanFrame;

/// Anything the [`Bus`] can read/write bytes through. Implemented for the
/// boxed real serial port; test code implements it for an in-memory mock.
pub trait SerialIo: Read + Write + Send {}
impl<T: Read + Write + Send + ?Sized> SerialIo for T {}

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const INIT_SETTLE: Duration = Duration::from_millis(100);

/// Owns one serial handle speaking the SLCAN ASCII protocol. All access is
/// expected to be serialized by the caller (the Bus Coordinator, in the
/// full stack); this type itself does no locking.
pub struct Bus {
    port: Box<dyn SerialIo>,
    read_buf: String,
}

impl Bus {
    /// Opens the named serial port and runs the SLCAN init sequence
    /// (`C`, `S6`, `O`), settling after each line.
    pub fn open(port_name: &str, baud: u32, timeout: Duration) -> Result<Self, Error> {
        let serial = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| Error::TransportOpen(e.to_string()))?;
        let mut bus = Self {
            port: serial,
            read_buf: String::new(),
        };
        bus.init_sequence(timeout)?;
        Ok(bus)
    }

    /// Wraps an already-open duplex byte stream, skipping the init sequence.
    /// Used by tests and by callers bridging a non-serial transport that
    /// already speaks SLCAN.
    pub fn from_io(io: Box<dyn SerialIo>) -> Self {
        Self {
            port: io,
            read_buf: String::new(),
        }
    }

    fn init_sequence(&mut self, timeout: Duration) -> Result<(), Error> {
        for cmd in ["C\r", "S6\r", "O\r"] {
            self.port
                .write_all(cmd.as_bytes())
                .map_err(|e| Error::TransportIO(e.to_string()))?;
            std::thread::sleep(INIT_SETTLE);
        }
        let _ = timeout;
        debug!("SLCAN transport initialized");
        Ok(())
    }

    pub fn send_frame(&mut self, frame_id: u32, data: &[u8]) -> Result<(), Error> {
        let line = SlcanFrame::new(frame_id, data.to_vec()).encode();
        self.drain_input();
        debug!(frame_id, len = data.len(), "tx frame");
        self.port
            .write_all(line.as_bytes())
            .map_err(|e| Error::TransportIO(e.to_string()))?;
        self.port.flush().map_err(|e| Error::TransportIO(e.to_string()))
    }

    /// Discards any bytes already sitting in the input buffer (the OS
    /// driver's and this transport's own line accumulator), so a reply to
    /// an earlier exchange that was never fully read can't bleed into the
    /// next one.
    fn drain_input(&mut self) {
        self.read_buf.clear();
        let mut scratch = [0u8; 256];
        loop {
            match self.port.read(&mut scratch) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }

    /// Polls for a `\r`-terminated line matching `expected_frame_id`.
    /// Non-matching frames are parsed and discarded, never buffered for a
    /// later call.
    pub fn recv_frame(&mut self, expected_frame_id: u32, timeout: Duration) -> Result<Vec<u8>, Error> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 256];

        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => {}
                Ok(n) => {
                    self.read_buf.push_str(&String::from_utf8_lossy(&chunk[..n]));
                    while let Some(pos) = self.read_buf.find('\r') {
                        let line: String = self.read_buf.drain(..=pos).collect();
                        match SlcanFrame::parse(&line) {
                            Ok(frame) if frame.id == expected_frame_id => return Ok(frame.data),
                            Ok(frame) => {
                                debug!(id = frame.id, expected = expected_frame_id, "discarding unmatched frame");
                            }
                            Err(e) => warn!(error = %e, "discarding malformed line"),
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(Error::TransportIO(e.to_string())),
            }

            if Instant::now() >= deadline {
                self.drain_input();
                return Err(Error::Timeout);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn close(&mut self) {
        if let Err(e) = self.port.write_all(b"C\r") {
            warn!(error = %e, "error sending close command on teardown");
        }
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    struct MockSerial {
        written: Vec<u8>,
        to_read: VecDeque<u8>,
    }

    impl MockSerial {
        fn with_response(line: &str) -> Self {
            Self {
                written: Vec::new(),
                to_read: line.bytes().collect(),
            }
        }
    }

    impl Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.to_read.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
            }
            let mut n = 0;
            while n < buf.len() {
                match self.to_read.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl Write for MockSerial {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recv_matches_scenario_s4() {
        let frame = SlcanFrame::new(0x0100, vec![0x36, 0x01, 0x00, 0x00, 0x1C, 0x19, 0x6B]);
        let mock = MockSerial::with_response(&frame.encode());
        let mut bus = Bus::from_io(Box::new(mock));
        let data = bus.recv_frame(0x0100, Duration::from_millis(200)).unwrap();
        assert_eq!(data, vec![0x36, 0x01, 0x00, 0x00, 0x1C, 0x19, 0x6B]);
    }

    #[test]
    fn recv_discards_unmatched_frame() {
        let unmatched = SlcanFrame::new(0x0200, vec![0x01, 0x02, 0x03, 0x04]).encode();
        let matched = SlcanFrame::new(0x0100, vec![0xF3, 0x02, 0x6B]).encode();
        let mock = MockSerial::with_response(&format!("{unmatched}{matched}"));
        let mut bus = Bus::from_io(Box::new(mock));
        let data = bus.recv_frame(0x0100, Duration::from_millis(200)).unwrap();
        assert_eq!(data, vec![0xF3, 0x02, 0x6B]);
    }

    #[test]
    fn recv_times_out_when_nothing_matches() {
        let mock = MockSerial {
            written: Vec::new(),
            to_read: VecDeque::new(),
        };
        let mut bus = Bus::from_io(Box::new(mock));
        let result = bus.recv_frame(0x0100, Duration::from_millis(30));
        assert!(matches!(result, Err(Error::Timeout)));
    }
}
