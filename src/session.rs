//! One game: send the maze, wait for the board, then play moves from input.

use std::io::{self, BufRead};
use std::path::Path;
use std::time::{Duration, Instant};

use amaze_protocol::{Command, Handshake, LinkEndpoint, MazeBuffer, Position, ProtocolError};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to read moves: {0}")]
    Input(#[from] io::Error),
}

/// How the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// Walked onto the exit
    Escaped,
    /// Sent the exit command
    Abandoned,
    /// Ran out of moves
    InputClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub ending: Ending,
    pub position: Position,
    /// Moves that went out on the link
    pub moves_sent: usize,
    /// Moves rejected locally
    pub moves_blocked: usize,
    pub elapsed: Duration,
}

/// Read a maze file, one row per line, dropping trailing blank lines.
pub fn load_maze(path: &Path) -> io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows: Vec<String> = text.lines().map(str::to_string).collect();
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    Ok(rows)
}

/// Warn if the rows don't form a square grid. The device is sent the
/// rows regardless.
fn check_shape(rows: &[String]) {
    let size = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
        warn!(
            "Maze is not square: {} rows but row {} has {} cells",
            size,
            i,
            row.len()
        );
    }
}

/// Play one game.
pub fn run_session<E: LinkEndpoint, R: BufRead>(
    hs: &mut Handshake<E>,
    rows: &[String],
    start: Position,
    input: R,
) -> Result<SessionReport, SessionError> {
    check_shape(rows);
    debug!("Link settings: {:?}", hs.config());

    let maze: MazeBuffer = hs.transfer_maze(rows)?;
    hs.await_ready()?;
    info!("Maze of size {} loaded, starting at {}", maze.size(), start);

    let started = Instant::now();
    let mut report = SessionReport {
        ending: Ending::InputClosed,
        position: start,
        moves_sent: 0,
        moves_blocked: 0,
        elapsed: Duration::ZERO,
    };

    'input: for line in input.lines() {
        for symbol in line?.split_whitespace() {
            let command: Command = match symbol.parse() {
                Ok(c) => c,
                Err(e) => {
                    debug!("Ignoring input: {}", e);
                    continue;
                }
            };

            let outcome = hs.send_move(command, &maze, report.position)?;
            if command == Command::ExitNow || outcome.position != report.position {
                report.moves_sent += 1;
            } else {
                report.moves_blocked += 1;
            }
            report.position = outcome.position;

            if outcome.exit_reached {
                report.ending = Ending::Escaped;
                break 'input;
            }
            if command == Command::ExitNow {
                report.ending = Ending::Abandoned;
                break 'input;
            }
        }
    }

    report.elapsed = started.elapsed();
    Ok(report)
}
