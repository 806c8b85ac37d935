//! In-process link to a [`DeviceModel`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::codec::Line;
use crate::device::DeviceModel;
use crate::error::LinkError;
use crate::link::{fmt_bytes, Link, LinkEndpoint};

/// Endpoint backed by a device model living in this process.
///
/// Clones share the same device, so a test can keep one handle to inspect
/// the device while the handshake owns another.
#[derive(Debug, Clone, Default)]
pub struct EmulatedEndpoint {
    device: Rc<RefCell<DeviceModel>>,
    opens: Rc<Cell<usize>>,
}

impl EmulatedEndpoint {
    pub fn new(device: DeviceModel) -> Self {
        EmulatedEndpoint {
            device: Rc::new(RefCell::new(device)),
            opens: Rc::new(Cell::new(0)),
        }
    }

    /// Shared handle to the device
    pub fn device(&self) -> Rc<RefCell<DeviceModel>> {
        self.device.clone()
    }

    /// How many links have been opened so far
    pub fn opens(&self) -> usize {
        self.opens.get()
    }
}

impl LinkEndpoint for EmulatedEndpoint {
    type Link = EmulatedLink;

    fn open(&mut self, _timeout: Duration) -> Result<EmulatedLink, LinkError> {
        self.opens.set(self.opens.get() + 1);
        Ok(EmulatedLink {
            device: self.device.clone(),
        })
    }
}

pub struct EmulatedLink {
    device: Rc<RefCell<DeviceModel>>,
}

impl Link for EmulatedLink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        log::trace!("[LINK] -> {} bytes: {}", bytes.len(), fmt_bytes(bytes));
        self.device.borrow_mut().feed(bytes);
        Ok(())
    }

    fn recv_line(&mut self) -> Result<Option<Line>, LinkError> {
        Ok(self.device.borrow_mut().pop_line().map(|raw| Line::decode(&raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Command;
    use crate::config::ProtocolConfig;
    use crate::device::DevicePhase;
    use crate::handshake::Handshake;
    use crate::maze::{Position, START_POSITION};

    const MAZE: [&str; 5] = ["WWWWW", "  W F", "W   W", "W W W", "WWWWW"];

    #[test]
    fn test_full_game_against_model() {
        let endpoint = EmulatedEndpoint::new(DeviceModel::with_boot_polls(3));
        let device = endpoint.device();
        let config = ProtocolConfig::immediate().with_max_ready_attempts(1000);
        let mut hs = Handshake::with_config(endpoint.clone(), config);

        let maze = hs.transfer_maze(&MAZE).unwrap();
        assert!(*device.borrow().maze() == MAZE[..]);
        hs.await_ready().unwrap();

        let mut pos = START_POSITION;
        let path = [
            Command::Right,
            Command::Up, // blocked at y == 1, never sent
            Command::Down,
            Command::Right,
            Command::Right,
            Command::Up,
            Command::Right,
        ];
        let mut exit_reached = false;
        for command in path {
            let outcome = hs.send_move(command, &maze, pos).unwrap();
            pos = outcome.position;
            exit_reached = outcome.exit_reached;
        }

        assert!(exit_reached);
        assert_eq!(pos, Position::new(4, 1));
        let device = device.borrow();
        assert_eq!(device.cursor(), pos);
        assert_eq!(device.phase(), DevicePhase::Finished);
        assert_eq!(device.moves().len(), 6);
        // transfer + await_ready + one link per transmitted move
        assert_eq!(endpoint.opens(), 2 + 6);
    }

    #[test]
    fn test_exit_now_ends_game_on_device() {
        let endpoint = EmulatedEndpoint::new(DeviceModel::new());
        let mut hs = Handshake::with_config(endpoint.clone(), ProtocolConfig::immediate());

        let maze = hs.transfer_maze(&MAZE).unwrap();
        let outcome = hs.send_move(Command::ExitNow, &maze, START_POSITION).unwrap();

        assert_eq!(outcome.position, START_POSITION);
        assert!(endpoint.device().borrow().is_finished());
    }
}
