//! Behavioural model of the display firmware.
//!
//! Bytes from the host go in through [`DeviceModel::feed`], reply lines come
//! out through [`DeviceModel::pop_line`]. The model keeps its state between
//! links, like the real board does when the host closes and reopens the port.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::codec::{Command, Sentinel, LINE_TERMINATOR};
use crate::maze::{MazeBuffer, Position, FINISH, START_POSITION};

/// Line ending the firmware prints with
const REPLY_END: &[u8] = b"\r\n";

/// Printed in answer to polls while booting
const BUSY_REPLY: &[u8] = b"B\r\n";

/// Firmware phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePhase {
    /// Answers `%` with a busy line until the boot delay has passed
    Booting,
    /// Answers `%` with `S`
    AwaitingMaze,
    /// Collecting rows until `O`
    ReceivingMaze,
    /// Answers `%` with `Q` and move commands with `*`
    Playing,
    /// Confirmed a command, waiting for the host's `Q`
    AwaitingAck(Command),
    /// Exit reached or exit command received
    Finished,
}

#[derive(Debug, Clone)]
pub struct DeviceModel {
    phase: DevicePhase,
    boot_polls: u32,
    boot_polls_left: u32,
    partial_row: Vec<u8>,
    maze: MazeBuffer,
    cursor: Position,
    moves: Vec<Command>,
    outbox: VecDeque<u8>,
}

impl Default for DeviceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceModel {
    /// A device that is ready for a maze straight away
    pub fn new() -> Self {
        Self::with_boot_polls(0)
    }

    /// A device that answers the first `polls` `%` bytes with a busy line
    pub fn with_boot_polls(polls: u32) -> Self {
        DeviceModel {
            phase: if polls == 0 {
                DevicePhase::AwaitingMaze
            } else {
                DevicePhase::Booting
            },
            boot_polls: polls,
            boot_polls_left: polls,
            partial_row: Vec::new(),
            maze: MazeBuffer::new(),
            cursor: START_POSITION,
            moves: Vec::new(),
            outbox: VecDeque::new(),
        }
    }

    /// Back to power-on state, as after pressing the reset button
    pub fn reset(&mut self) {
        debug!("[DEVICE] reset");
        *self = Self::with_boot_polls(self.boot_polls);
    }

    pub fn phase(&self) -> DevicePhase {
        self.phase
    }

    /// Rows received so far
    pub fn maze(&self) -> &MazeBuffer {
        &self.maze
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Commands confirmed so far, in order
    pub fn moves(&self) -> &[Command] {
        &self.moves
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DevicePhase::Finished
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.process_byte(byte);
        }
    }

    /// Drain all pending reply bytes
    pub fn take_output(&mut self) -> Vec<u8> {
        self.outbox.drain(..).collect()
    }

    /// Next complete reply line including its terminator
    pub fn pop_line(&mut self) -> Option<Vec<u8>> {
        let end = self.outbox.iter().position(|&b| b == LINE_TERMINATOR)?;
        Some(self.outbox.drain(..=end).collect())
    }

    fn reply(&mut self, sentinel: Sentinel) {
        trace!("[DEVICE] -> {}", sentinel);
        self.outbox.push_back(sentinel.as_byte());
        self.outbox.extend(REPLY_END);
    }

    fn process_byte(&mut self, byte: u8) {
        trace!("[DEVICE] <- {:?} in {:?}", byte as char, self.phase);
        let poll = byte == Sentinel::Poll.as_byte();

        match self.phase {
            DevicePhase::Booting => {
                if poll {
                    self.outbox.extend(BUSY_REPLY);
                    self.boot_polls_left = self.boot_polls_left.saturating_sub(1);
                    if self.boot_polls_left == 0 {
                        debug!("[DEVICE] boot complete");
                        self.phase = DevicePhase::AwaitingMaze;
                    }
                }
            }
            DevicePhase::AwaitingMaze => {
                if poll {
                    self.reply(Sentinel::MazeReady);
                    self.phase = DevicePhase::ReceivingMaze;
                }
            }
            DevicePhase::ReceivingMaze => self.receive_maze_byte(byte),
            DevicePhase::Playing => {
                if poll {
                    self.reply(Sentinel::Ack);
                } else if let Some(command) = Command::from_byte(byte) {
                    self.apply(command);
                    self.moves.push(command);
                    self.reply(Sentinel::Confirm);
                    self.phase = DevicePhase::AwaitingAck(command);
                }
            }
            DevicePhase::AwaitingAck(command) => {
                // Retransmissions of the confirmed command are dropped here
                if byte == Sentinel::Ack.as_byte() {
                    let done = command == Command::ExitNow || self.maze.cell(self.cursor) == Some(FINISH);
                    self.phase = if done {
                        debug!("[DEVICE] game over at {}", self.cursor);
                        DevicePhase::Finished
                    } else {
                        DevicePhase::Playing
                    };
                }
            }
            DevicePhase::Finished => {
                if poll {
                    self.reply(Sentinel::Ack);
                }
            }
        }
    }

    fn receive_maze_byte(&mut self, byte: u8) {
        let at_row_start = self.partial_row.is_empty();
        match byte {
            // The host may poll again before it saw our S
            b'%' if at_row_start && self.maze.is_empty() => self.reply(Sentinel::MazeReady),
            b'O' if at_row_start => {
                debug!("[DEVICE] maze complete: {} rows", self.maze.size());
                self.cursor = START_POSITION;
                self.phase = DevicePhase::Playing;
            }
            b'\r' => {}
            LINE_TERMINATOR => {
                let row = String::from_utf8_lossy(&self.partial_row).to_string();
                self.partial_row.clear();
                self.maze.push_row(row);
            }
            _ => self.partial_row.push(byte),
        }
    }

    /// Move the cursor. The host has already checked legality.
    fn apply(&mut self, command: Command) {
        let Position { x, y } = self.cursor;
        self.cursor = match command {
            Command::Up => Position::new(x, y.saturating_sub(1)),
            Command::Down => Position::new(x, y + 1),
            Command::Left => Position::new(x.saturating_sub(1), y),
            Command::Right => Position::new(x + 1, y),
            Command::ExitNow => self.cursor,
        };
        debug!("[DEVICE] {} -> cursor {}", command, self.cursor);
    }
}
