//! Link parameters and retry cadence.

use std::time::Duration;

/// Baud rate the display firmware is built for
pub const DEFAULT_BAUD: u32 = 9600;

/// Where the display usually shows up on Linux
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

/// Timing and retry settings for [`Handshake`](crate::Handshake).
///
/// The defaults reproduce the cadence the display firmware was tuned
/// against. Changing them changes how hard the host spins on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Read timeout while waiting for generic readiness
    pub ready_timeout: Duration,
    /// Read timeout during maze transfer and move exchange
    pub poll_timeout: Duration,
    /// Pause after an unexpected reply while polling for readiness
    pub retry_delay: Duration,
    /// Pause after an unexpected reply during a move exchange
    pub reject_delay: Duration,
    /// Cap on `%` polls sent while waiting for `Q` or for `S`. Silent reads
    /// during maze transfer are not counted. `None` keeps polling forever.
    pub max_ready_attempts: Option<u32>,
    /// Cap on command retransmissions per move. `None` keeps retrying forever.
    pub max_move_attempts: Option<u32>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            ready_timeout: Duration::from_millis(100),
            poll_timeout: Duration::from_millis(1),
            retry_delay: Duration::from_secs(2),
            reject_delay: Duration::from_secs(1),
            max_ready_attempts: None,
            max_move_attempts: None,
        }
    }
}

impl ProtocolConfig {
    /// Same message sequence as the default, without any sleeping.
    ///
    /// Meant for in-process devices that answer instantly.
    pub fn immediate() -> Self {
        ProtocolConfig {
            retry_delay: Duration::ZERO,
            reject_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_ready_attempts(mut self, attempts: u32) -> Self {
        self.max_ready_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn with_max_move_attempts(mut self, attempts: u32) -> Self {
        self.max_move_attempts = Some(attempts);
        self
    }
}
