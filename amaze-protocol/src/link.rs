//! Byte-level channel abstraction.
//!
//! A [`LinkEndpoint`] knows how to reach the device. Each protocol operation
//! opens a fresh [`Link`] from it and drops the link when the operation ends,
//! so nothing is held open between operations.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use crate::codec::{Line, LINE_TERMINATOR};
use crate::error::LinkError;

/// An open channel to the device.
pub trait Link {
    /// Write all bytes and flush
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Read one line, waiting at most the timeout the link was opened with.
    ///
    /// Returns `Ok(None)` if nothing arrived. A read that times out part way
    /// through a line returns the partial line.
    fn recv_line(&mut self) -> Result<Option<Line>, LinkError>;
}

/// Something a [`Link`] can be opened to.
pub trait LinkEndpoint {
    type Link: Link;

    /// Open a link whose reads block for at most `timeout`
    fn open(&mut self, timeout: Duration) -> Result<Self::Link, LinkError>;
}

impl<E: LinkEndpoint + ?Sized> LinkEndpoint for &mut E {
    type Link = E::Link;

    fn open(&mut self, timeout: Duration) -> Result<Self::Link, LinkError> {
        (**self).open(timeout)
    }
}

/// What a zero-length read means on a given transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Eof {
    /// Serial drivers may return 0 bytes when the timeout expires
    Timeout,
    /// Stream sockets return 0 bytes once the peer has gone
    Closed,
}

/// Read bytes one at a time up to and including `\n`.
///
/// Reading a byte at a time keeps anything past the newline in the driver,
/// where the next opened link will find it.
pub(crate) fn read_line<R: Read + ?Sized>(reader: &mut R, eof: Eof) -> Result<Option<Line>, LinkError> {
    let mut raw = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                if raw.is_empty() && eof == Eof::Closed {
                    return Err(LinkError::Closed);
                }
                break;
            }
            Ok(_) => {
                raw.push(byte[0]);
                if byte[0] == LINE_TERMINATOR {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
            Err(e) => return Err(LinkError::Io(e)),
        }
    }
    log::trace!("[LINK] <- {} bytes: {}", raw.len(), fmt_bytes(&raw));
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Line::decode(&raw)))
    }
}

/// Format bytes as printable text for trace output
pub(crate) fn fmt_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            b'\n' => "\\n".to_string(),
            b'\r' => "\\r".to_string(),
            0x20..=0x7e => (b as char).to_string(),
            _ => format!("\\x{:02X}", b),
        })
        .collect()
}
