//! Control vocabulary and line encoding for the maze link.
//!
//! Everything on the wire is ASCII. Control signals are single bytes, maze rows
//! are sent as text terminated by `\n`, and the device answers with short
//! text lines whose first character carries the meaning.

use std::fmt;
use std::str::FromStr;

/// Terminator appended to every maze row
pub const LINE_TERMINATOR: u8 = b'\n';

/// Raw byte values
mod wire {
    pub const POLL: u8 = b'%';
    pub const MAZE_READY: u8 = b'S';
    pub const PAYLOAD_END: u8 = b'O';
    pub const CONFIRM: u8 = b'*';
    pub const ACK: u8 = b'Q';

    pub const UP: u8 = b'U';
    pub const DOWN: u8 = b'D';
    pub const LEFT: u8 = b'L';
    pub const RIGHT: u8 = b'R';
    pub const EXIT_NOW: u8 = b'O';
}

/// Reserved single-byte control signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// `%` host→device: idle poll / keep-alive
    Poll,
    /// `S` device→host: ready to receive maze rows
    MazeReady,
    /// `O` host→device: maze payload complete
    PayloadEnd,
    /// `*` device→host: move command received and processed
    Confirm,
    /// `Q` both ways: host closes a round, device reports readiness
    Ack,
}

impl Sentinel {
    pub const fn as_byte(self) -> u8 {
        match self {
            Sentinel::Poll => wire::POLL,
            Sentinel::MazeReady => wire::MAZE_READY,
            Sentinel::PayloadEnd => wire::PAYLOAD_END,
            Sentinel::Confirm => wire::CONFIRM,
            Sentinel::Ack => wire::ACK,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            wire::POLL => Some(Sentinel::Poll),
            wire::MAZE_READY => Some(Sentinel::MazeReady),
            wire::PAYLOAD_END => Some(Sentinel::PayloadEnd),
            wire::CONFIRM => Some(Sentinel::Confirm),
            wire::ACK => Some(Sentinel::Ack),
            _ => None,
        }
    }

    /// Encode to wire format
    pub fn encode(self) -> [u8; 1] {
        [self.as_byte()]
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_byte() as char)
    }
}

/// A movement command, already resolved from whatever input device the
/// caller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    /// Leave the maze early. Shares its byte with [`Sentinel::PayloadEnd`].
    ExitNow,
}

impl Command {
    pub const fn as_byte(self) -> u8 {
        match self {
            Command::Up => wire::UP,
            Command::Down => wire::DOWN,
            Command::Left => wire::LEFT,
            Command::Right => wire::RIGHT,
            Command::ExitNow => wire::EXIT_NOW,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            wire::UP => Some(Command::Up),
            wire::DOWN => Some(Command::Down),
            wire::LEFT => Some(Command::Left),
            wire::RIGHT => Some(Command::Right),
            wire::EXIT_NOW => Some(Command::ExitNow),
            _ => None,
        }
    }

    /// Encode to wire format
    pub fn encode(self) -> [u8; 1] {
        [self.as_byte()]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// Error for a symbol that isn't one of `U`, `D`, `L`, `R`, `O`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command symbol {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().as_bytes() {
            [byte] => Command::from_byte(byte.to_ascii_uppercase())
                .ok_or_else(|| UnknownCommand(s.to_string())),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

/// Encode one maze row: the row text followed by a single `\n`.
///
/// A terminator already present on the row is replaced, not doubled.
pub fn encode_row(row: &str) -> Vec<u8> {
    let row = strip_terminator(row);
    let mut out = Vec::with_capacity(row.len() + 1);
    out.extend(row.as_bytes());
    out.push(LINE_TERMINATOR);
    out
}

fn strip_terminator(s: &str) -> &str {
    s.trim_end_matches(['\r', '\n'])
}

/// A line received from the device, with its terminator removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line(String);

impl Line {
    /// Decode raw bytes read from the link
    pub fn decode(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        Line(strip_terminator(&text).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sentinel carried by the first character, if any
    pub fn leading(&self) -> Option<Sentinel> {
        self.0.bytes().next().and_then(Sentinel::from_byte)
    }

    pub fn starts_with(&self, sentinel: Sentinel) -> bool {
        self.leading() == Some(sentinel)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Line(strip_terminator(s).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_vocabulary() {
        assert_eq!(Sentinel::Poll.encode(), *b"%");
        assert_eq!(Sentinel::MazeReady.as_byte(), b'S');
        assert_eq!(Sentinel::PayloadEnd.as_byte(), b'O');
        assert_eq!(Sentinel::Confirm.as_byte(), b'*');
        assert_eq!(Sentinel::Ack.as_byte(), b'Q');
    }

    #[test]
    fn test_exit_shares_payload_end_byte() {
        assert_eq!(Command::ExitNow.as_byte(), Sentinel::PayloadEnd.as_byte());
        assert_eq!(Command::Down.encode(), *b"D");
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(Sentinel::from_byte(b'X'), None);
        assert_eq!(Command::from_byte(b'%'), None);
    }

    #[test]
    fn test_parse_command_symbols() {
        assert_eq!("U".parse::<Command>(), Ok(Command::Up));
        assert_eq!(" r\n".parse::<Command>(), Ok(Command::Right));
        assert_eq!("o".parse::<Command>(), Ok(Command::ExitNow));
        assert!("UP".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn test_encode_row_terminates_once() {
        assert_eq!(encode_row("W W W"), b"W W W\n".to_vec());
        assert_eq!(encode_row("W . F\r\n"), b"W . F\n".to_vec());
        assert_eq!(encode_row(""), b"\n".to_vec());
    }

    #[test]
    fn test_decode_strips_terminator() {
        let line = Line::decode(b"*done\r\n");
        assert_eq!(line.as_str(), "*done");
        assert!(line.starts_with(Sentinel::Confirm));
        assert!(!line.starts_with(Sentinel::Ack));
    }

    #[test]
    fn test_decode_blank_line() {
        let line = Line::decode(b"\r\n");
        assert!(line.is_empty());
        assert_eq!(line.leading(), None);
    }
}
