//! Error types for the link and handshake layers.

use std::io;

use thiserror::Error;

/// Failures of the physical channel.
///
/// Any of these ends the operation in progress. The handshake layer never
/// retries them; the operator is expected to reset the device and start over.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The channel could not be opened
    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: io::Error,
    },

    /// I/O error during read/write
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by the serial port driver
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Peer went away
    #[error("link closed by peer")]
    Closed,
}

/// Errors surfaced by [`Handshake`](crate::Handshake) operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Link(#[from] LinkError),

    /// A maze row can't be sent as-is over the ASCII link
    #[error("maze row {row} contains non-ASCII characters")]
    NonAsciiRow { row: usize },

    /// An attempt cap from [`ProtocolConfig`](crate::ProtocolConfig) was hit
    #[error("{phase}: gave up after {attempts} attempts")]
    RetriesExhausted { phase: &'static str, attempts: u32 },
}

impl ProtocolError {
    /// True if the failure came from the channel itself.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, ProtocolError::Link(_))
    }
}
