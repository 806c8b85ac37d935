//! Host side of the maze handshake.
//!
//! Three operations make up the whole conversation with the display:
//!
//! 1. [`Handshake::transfer_maze`] polls with `%` until the device answers
//!    `S`, streams the maze rows and closes the payload with `O`.
//! 2. [`Handshake::await_ready`] polls with `%` until the device answers `Q`.
//! 3. [`Handshake::send_move`] repeats a command byte until the device
//!    answers `*`, then closes the round with `Q`.
//!
//! Each operation opens its own link and drops it before returning. Nothing
//! is acknowledged per maze row, and the default configuration never gives
//! up on a silent device.

use std::thread;
use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::codec::{encode_row, Command, Line, Sentinel};
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::link::{Link, LinkEndpoint};
use crate::maze::{MazeBuffer, Position};
use crate::validator::validate;

/// Where the handshake currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    AwaitingReadiness,
    TransferringPayload,
    AwaitingMoveAck,
}

/// Result of one poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// The expected sentinel arrived
    Ready,
    /// Nothing arrived within the link timeout
    Timeout,
    /// Something else arrived
    Failed(Line),
}

impl PollResult {
    fn classify(reply: Option<Line>, expected: Sentinel) -> Self {
        match reply {
            None => PollResult::Timeout,
            Some(line) if line.starts_with(expected) => PollResult::Ready,
            Some(line) => PollResult::Failed(line),
        }
    }
}

/// What a move request ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolOutcome {
    /// New position, or the old one if the move was illegal
    pub position: Position,
    /// The move landed on the exit cell
    pub exit_reached: bool,
}

/// Host-side handshake state machine over a [`LinkEndpoint`].
pub struct Handshake<E: LinkEndpoint> {
    endpoint: E,
    config: ProtocolConfig,
    state: HandshakeState,
}

impl<E: LinkEndpoint> Handshake<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_config(endpoint, ProtocolConfig::default())
    }

    pub fn with_config(endpoint: E, config: ProtocolConfig) -> Self {
        Handshake {
            endpoint,
            config,
            state: HandshakeState::Idle,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn enter(&mut self, state: HandshakeState) {
        if self.state != state {
            debug!("[PROTO] {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Run `op` in `state`, returning to `Idle` whatever the outcome
    fn in_state<T>(
        &mut self,
        state: HandshakeState,
        op: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        self.enter(state);
        let result = op(self);
        self.enter(HandshakeState::Idle);
        result
    }

    /// One readiness poll: send `%`, read one line, expect `Q`.
    ///
    /// For callers that want their own retry policy instead of
    /// [`await_ready`](Self::await_ready)'s fixed cadence.
    pub fn poll_ready(&mut self) -> Result<PollResult, ProtocolError> {
        self.in_state(HandshakeState::AwaitingReadiness, |hs| {
            let mut link = hs.endpoint.open(hs.config.ready_timeout)?;
            ready_cycle(&mut link)
        })
    }

    /// Poll until the device reports readiness with a line starting `Q`.
    pub fn await_ready(&mut self) -> Result<(), ProtocolError> {
        self.in_state(HandshakeState::AwaitingReadiness, |hs| {
            let mut link = hs.endpoint.open(hs.config.ready_timeout)?;
            let mut attempts = 0;
            loop {
                attempts += 1;
                match ready_cycle(&mut link)? {
                    PollResult::Ready => {
                        info!("[PROTO] device ready after {} poll(s)", attempts);
                        return Ok(());
                    }
                    PollResult::Timeout => warn!("[PROTO] waiting for Q, got nothing"),
                    PollResult::Failed(line) => warn!("[PROTO] waiting for Q, got: {:?}", line.as_str()),
                }
                check_attempts(hs.config.max_ready_attempts, attempts, "awaiting readiness")?;
                pause(hs.config.retry_delay);
            }
        })
    }

    /// Send the maze to the device once it answers `S`, returning the rows
    /// exactly as they went out.
    ///
    /// An empty payload is still closed with `O`.
    pub fn transfer_maze<S: AsRef<str>>(&mut self, payload: &[S]) -> Result<MazeBuffer, ProtocolError> {
        if let Some(row) = payload.iter().position(|r| !r.as_ref().is_ascii()) {
            return Err(ProtocolError::NonAsciiRow { row });
        }

        self.in_state(HandshakeState::AwaitingReadiness, |hs| {
            let mut link = hs.endpoint.open(hs.config.poll_timeout)?;
            link.send(&Sentinel::Poll.encode())?;

            // Polls sent so far. Silent reads don't count, only rejected polls.
            let mut polls = 1;
            let mut stalled = false;
            loop {
                match PollResult::classify(link.recv_line()?, Sentinel::MazeReady) {
                    PollResult::Ready => break,
                    PollResult::Timeout => {
                        if !stalled {
                            warn!("[PROTO] device likely stalled, reset it if this persists");
                            stalled = true;
                        } else {
                            trace!("[PROTO] still no reply from device");
                        }
                    }
                    PollResult::Failed(line) => {
                        stalled = false;
                        debug!("[PROTO] device not ready for maze, got: {:?}", line.as_str());
                        check_attempts(hs.config.max_ready_attempts, polls, "maze transfer")?;
                        link.send(&Sentinel::Poll.encode())?;
                        polls += 1;
                        pause(hs.config.retry_delay);
                    }
                }
            }

            hs.enter(HandshakeState::TransferringPayload);
            let mut maze = MazeBuffer::new();
            for row in payload {
                let encoded = encode_row(row.as_ref());
                link.send(&encoded)?;
                maze.push_row(String::from_utf8_lossy(&encoded[..encoded.len() - 1]));
            }
            link.send(&Sentinel::PayloadEnd.encode())?;
            info!("[PROTO] maze sent: {} rows", maze.size());
            Ok(maze)
        })
    }

    /// Request a move from `pos`.
    ///
    /// Illegal moves return the unchanged position without touching the
    /// link. Legal moves and [`Command::ExitNow`] are repeated until the
    /// device confirms with `*`, and the round is closed with `Q`. A move
    /// onto the exit cell still goes out as its directional byte.
    pub fn send_move(
        &mut self,
        command: Command,
        maze: &MazeBuffer,
        pos: Position,
    ) -> Result<ProtocolOutcome, ProtocolError> {
        let check = validate(maze, pos, command);
        if !check.legal {
            debug!("[PROTO] {} from {} is blocked, nothing sent", command, pos);
            return Ok(ProtocolOutcome {
                position: pos,
                exit_reached: false,
            });
        }
        let exit_reached = maze.is_finish(check.position);

        self.in_state(HandshakeState::AwaitingMoveAck, |hs| {
            let mut link = hs.endpoint.open(hs.config.poll_timeout)?;
            let mut attempts = 0;
            loop {
                attempts += 1;
                link.send(&command.encode())?;
                match PollResult::classify(link.recv_line()?, Sentinel::Confirm) {
                    PollResult::Ready => {
                        link.send(&Sentinel::Ack.encode())?;
                        debug!("[PROTO] {} confirmed after {} attempt(s)", command, attempts);
                        return Ok(());
                    }
                    PollResult::Timeout => {}
                    PollResult::Failed(line) => {
                        debug!("[PROTO] waiting for *, got: {:?}", line.as_str());
                        pause(hs.config.reject_delay);
                    }
                }
                check_attempts(hs.config.max_move_attempts, attempts, "move exchange")?;
            }
        })?;

        if exit_reached {
            info!("[PROTO] exit reached at {}", check.position);
        }
        Ok(ProtocolOutcome {
            position: check.position,
            exit_reached,
        })
    }
}

fn ready_cycle<L: Link>(link: &mut L) -> Result<PollResult, ProtocolError> {
    link.send(&Sentinel::Poll.encode())?;
    Ok(PollResult::classify(link.recv_line()?, Sentinel::Ack))
}

fn check_attempts(cap: Option<u32>, attempts: u32, phase: &'static str) -> Result<(), ProtocolError> {
    match cap {
        Some(max) if attempts >= max => Err(ProtocolError::RetriesExhausted { phase, attempts }),
        _ => Ok(()),
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
