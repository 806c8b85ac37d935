//! Serial port transport.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;

use crate::codec::Line;
use crate::config::{DEFAULT_BAUD, DEFAULT_SERIAL_PORT};
use crate::error::LinkError;
use crate::link::{fmt_bytes, read_line, Eof, Link, LinkEndpoint};

/// A serial device, opened anew for every protocol operation
#[derive(Debug, Clone)]
pub struct SerialEndpoint {
    path: String,
    baud_rate: u32,
}

impl SerialEndpoint {
    pub fn new<S: Into<String>>(path: S, baud_rate: u32) -> Self {
        SerialEndpoint {
            path: path.into(),
            baud_rate,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Default for SerialEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_PORT, DEFAULT_BAUD)
    }
}

impl std::fmt::Display for SerialEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {} baud", self.path, self.baud_rate)
    }
}

impl LinkEndpoint for SerialEndpoint {
    type Link = SerialLink;

    fn open(&mut self, timeout: Duration) -> Result<SerialLink, LinkError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| LinkError::Open {
                target: self.path.clone(),
                source: e.into(),
            })?;
        log::trace!("[LINK] opened {} (timeout {:?})", self, timeout);
        Ok(SerialLink { port })
    }
}

/// An open serial port. Closed on drop.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl Link for SerialLink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        log::trace!("[LINK] -> {} bytes: {}", bytes.len(), fmt_bytes(bytes));
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<Option<Line>, LinkError> {
        read_line(&mut *self.port, Eof::Timeout)
    }
}

/// Names of the serial ports present on this machine
pub fn available_ports() -> Result<Vec<String>, LinkError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = SerialEndpoint::default();
        assert_eq!(endpoint.path(), "/dev/ttyACM0");
        assert_eq!(endpoint.baud_rate(), 9600);
        assert_eq!(endpoint.to_string(), "/dev/ttyACM0 @ 9600 baud");
    }

    #[test]
    fn test_open_missing_port_fails() {
        let mut endpoint = SerialEndpoint::new("/dev/amaze-test-no-such-port", DEFAULT_BAUD);
        match endpoint.open(Duration::from_millis(1)) {
            Err(LinkError::Open { target, .. }) => {
                assert_eq!(target, "/dev/amaze-test-no-such-port")
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("opened a port that does not exist"),
        }
    }
}
