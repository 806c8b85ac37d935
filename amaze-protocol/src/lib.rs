//! # Amaze Protocol
//!
//! Host side of the serial handshake used to drive the maze display board.
//!
//! ## Wire Format
//!
//! No framing, no checksums. Control signals are single ASCII bytes; the
//! maze goes out as text rows terminated by `\n`; the device answers with
//! short lines whose first character is the signal.
//!
//! | Byte | Direction | Meaning |
//! |------|-----------|---------|
//! | `%` | host→device | poll / keep-alive |
//! | `S` | device→host | ready for maze rows |
//! | row | host→device | one maze row + `\n` |
//! | `O` | host→device | maze complete, or "exit now" during play |
//! | `U` `D` `L` `R` | host→device | move command |
//! | `*` | device→host | command received |
//! | `Q` | both | host: round closed; device: ready |
//!
//! ## Example
//!
//! ```no_run
//! use amaze_protocol::{Command, Handshake, SerialEndpoint, START_POSITION};
//!
//! fn main() -> Result<(), amaze_protocol::ProtocolError> {
//!     let mut hs = Handshake::new(SerialEndpoint::default());
//!     let maze = hs.transfer_maze(&["WWW", "  F", "WWW"])?;
//!     hs.await_ready()?;
//!     let outcome = hs.send_move(Command::Right, &maze, START_POSITION)?;
//!     println!("now at {}", outcome.position);
//!     Ok(())
//! }
//! ```

pub mod codec;
mod config;
pub mod device;
mod emulated;
mod error;
mod handshake;
pub mod link;
mod maze;
mod serial;
pub mod socket;
mod validator;

pub use codec::{Command, Line, Sentinel, UnknownCommand};
pub use config::{ProtocolConfig, DEFAULT_BAUD, DEFAULT_SERIAL_PORT};
pub use device::{DeviceModel, DevicePhase};
pub use emulated::{EmulatedEndpoint, EmulatedLink};
pub use error::{LinkError, ProtocolError};
pub use handshake::{Handshake, HandshakeState, PollResult, ProtocolOutcome};
pub use link::{Link, LinkEndpoint};
pub use maze::{MazeBuffer, Position, FINISH, START_POSITION, WALL};
pub use serial::{available_ports, SerialEndpoint, SerialLink};
pub use socket::{DeviceConnection, SocketAddr, SocketEndpoint, SocketLink, SocketListener};
pub use validator::{validate, Validation};
