//! Maze buffer and cursor position shared by the caller and the protocol.

use std::fmt;
use std::str::FromStr;

/// Impassable cell
pub const WALL: u8 = b'W';
/// The exit
pub const FINISH: u8 = b'F';

/// Cursor position on the grid, 0-indexed, `x` is the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

/// Where a new game puts the cursor
pub const START_POSITION: Position = Position::new(0, 1);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = String;

    /// Parses `x,y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected x,y but got {:?}", s))?;
        let coord = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|e| format!("bad coordinate {:?}: {}", v, e))
        };
        Ok(Position::new(coord(x)?, coord(y)?))
    }
}

/// The maze rows as sent to the device.
///
/// Filled by [`Handshake::transfer_maze`](crate::Handshake::transfer_maze)
/// while the rows go out, then read by the move validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MazeBuffer {
    rows: Vec<String>,
}

impl MazeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MazeBuffer {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: S) {
        self.rows.push(row.into());
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Side length of the grid
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Marker at `[row][col]`, `None` outside the grid
    pub fn cell(&self, pos: Position) -> Option<u8> {
        self.rows
            .get(pos.y)
            .and_then(|row| row.as_bytes().get(pos.x))
            .copied()
    }

    pub fn is_finish(&self, pos: Position) -> bool {
        self.cell(pos) == Some(FINISH)
    }
}

impl PartialEq<[&str]> for MazeBuffer {
    fn eq(&self, other: &[&str]) -> bool {
        self.rows.len() == other.len() && self.rows.iter().zip(other).all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_lookup() {
        let maze = MazeBuffer::from_rows(["W W W", "W . F", "W W W"]);
        assert_eq!(maze.size(), 3);
        assert_eq!(maze.cell(Position::new(0, 0)), Some(b'W'));
        assert_eq!(maze.cell(Position::new(1, 1)), Some(b' '));
        assert!(maze.is_finish(Position::new(4, 1)));
        assert_eq!(maze.cell(Position::new(5, 1)), None);
        assert_eq!(maze.cell(Position::new(0, 3)), None);
    }

    #[test]
    fn test_position_parse() {
        assert_eq!("0,1".parse::<Position>(), Ok(START_POSITION));
        assert_eq!(" 3 , 7 ".parse::<Position>(), Ok(Position::new(3, 7)));
        assert!("3".parse::<Position>().is_err());
        assert!("a,1".parse::<Position>().is_err());
    }

    #[test]
    fn test_buffer_matches_rows() {
        let maze = MazeBuffer::from_rows(vec!["WF".to_string()]);
        assert!(maze == ["WF"][..]);
        assert!(maze != ["WW"][..]);
    }
}
