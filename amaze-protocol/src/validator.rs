//! Move legality against a static grid.
//!
//! The edge comparisons are the ones the display firmware was built
//! against: `Down` stops at `y == size` and `Up` stops at `y == 1`, not at
//! the grid's real edges. Destinations that fall off the grid are still
//! rejected by the cell lookup.

use crate::codec::Command;
use crate::maze::{MazeBuffer, Position, WALL};

/// Result of checking one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// Destination if legal, otherwise the starting position
    pub position: Position,
    pub legal: bool,
}

/// Decide whether `command` can be taken from `pos` on `grid`.
pub fn validate(grid: &MazeBuffer, pos: Position, command: Command) -> Validation {
    let size = grid.size();
    let target = match command {
        Command::ExitNow => {
            return Validation {
                position: pos,
                legal: true,
            }
        }
        Command::Down if pos.y != size => pos.y.checked_add(1).map(|y| Position::new(pos.x, y)),
        Command::Right if size.checked_sub(1) != Some(pos.x) => {
            pos.x.checked_add(1).map(|x| Position::new(x, pos.y))
        }
        Command::Up if pos.y != 1 => pos.y.checked_sub(1).map(|y| Position::new(pos.x, y)),
        Command::Left if pos.x != 0 => pos.x.checked_sub(1).map(|x| Position::new(x, pos.y)),
        _ => None,
    };

    match target.filter(|t| grid.cell(*t).is_some_and(|c| c != WALL)) {
        Some(position) => Validation {
            position,
            legal: true,
        },
        None => Validation {
            position: pos,
            legal: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5, open interior around (2, 2), exit at (4, 1)
    fn grid() -> MazeBuffer {
        MazeBuffer::from_rows(["WWWWW", "    F", "W   W", "W   W", "WWWWW"])
    }

    fn check(pos: Position, command: Command) -> Validation {
        validate(&grid(), pos, command)
    }

    #[test]
    fn test_interior_moves() {
        let centre = Position::new(2, 2);
        let cases = [
            (Command::Up, Position::new(2, 1)),
            (Command::Down, Position::new(2, 3)),
            (Command::Left, Position::new(1, 2)),
            (Command::Right, Position::new(3, 2)),
        ];
        for (command, expected) in cases {
            let v = check(centre, command);
            assert!(v.legal, "{:?} should be legal", command);
            assert_eq!(v.position, expected);
        }
    }

    #[test]
    fn test_wall_blocks() {
        let v = check(Position::new(1, 3), Command::Down);
        assert_eq!(v, Validation { position: Position::new(1, 3), legal: false });
        let v = check(Position::new(1, 2), Command::Left);
        assert!(!v.legal);
    }

    #[test]
    fn test_down_blocked_at_y_equal_size() {
        // An all-floor grid, so only the edge comparison can reject
        let open = MazeBuffer::from_rows([".....", ".....", ".....", ".....", "....."]);
        let pos = Position::new(2, 5);
        let v = validate(&open, pos, Command::Down);
        assert!(!v.legal);
        assert_eq!(v.position, pos);
    }

    #[test]
    fn test_down_off_last_row_rejected_by_lookup() {
        let open = MazeBuffer::from_rows([".....", ".....", ".....", ".....", "....."]);
        let v = validate(&open, Position::new(2, 4), Command::Down);
        assert!(!v.legal);
    }

    #[test]
    fn test_up_blocked_at_y_equal_one() {
        let open = MazeBuffer::from_rows([".....", ".....", ".....", ".....", "....."]);
        let pos = Position::new(2, 1);
        let v = validate(&open, pos, Command::Up);
        assert!(!v.legal);
        assert_eq!(v.position, pos);
        // One row further down, Up is allowed
        assert!(validate(&open, Position::new(2, 2), Command::Up).legal);
    }

    #[test]
    fn test_right_blocked_at_last_column() {
        let open = MazeBuffer::from_rows(["...", "...", "..."]);
        assert!(!validate(&open, Position::new(2, 1), Command::Right).legal);
        assert!(validate(&open, Position::new(1, 1), Command::Right).legal);
    }

    #[test]
    fn test_left_blocked_at_zero() {
        let v = check(Position::new(0, 1), Command::Left);
        assert!(!v.legal);
        assert_eq!(v.position, Position::new(0, 1));
    }

    #[test]
    fn test_exit_now_always_legal() {
        let pos = Position::new(0, 0);
        assert_eq!(check(pos, Command::ExitNow), Validation { position: pos, legal: true });
        assert!(validate(&MazeBuffer::new(), pos, Command::ExitNow).legal);
    }

    #[test]
    fn test_move_onto_finish_is_legal() {
        let v = check(Position::new(3, 1), Command::Right);
        assert!(v.legal);
        assert!(grid().is_finish(v.position));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let maze = grid();
        for command in [Command::Up, Command::Down, Command::Left, Command::Right, Command::ExitNow] {
            let pos = Position::new(1, 1);
            assert_eq!(validate(&maze, pos, command), validate(&maze, pos, command));
        }
    }

    #[test]
    fn test_empty_grid_rejects_moves() {
        let empty = MazeBuffer::new();
        assert!(!validate(&empty, Position::new(0, 0), Command::Right).legal);
        assert!(!validate(&empty, Position::new(0, 3), Command::Down).legal);
    }
}
