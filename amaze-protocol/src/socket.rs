//! Socket transport for Unix sockets and TCP connections.
//!
//! Lets the host talk to a serial-over-TCP bridge or to the device emulator
//! with the same line semantics as a serial port.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::Duration;

use crate::codec::Line;
use crate::error::LinkError;
use crate::link::{fmt_bytes, read_line, Eof, Link, LinkEndpoint};

/// Default socket path for Unix sockets
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/amaze-device.sock";

/// Sockets reject a zero read timeout, so this is the shortest one used
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Socket address type - either Unix socket path or TCP address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketAddr {
    #[cfg(unix)]
    Unix(String),
    Tcp(String),
}

impl SocketAddr {
    /// Create a Unix socket address
    #[cfg(unix)]
    pub fn unix<P: AsRef<Path>>(path: P) -> Self {
        SocketAddr::Unix(path.as_ref().to_string_lossy().to_string())
    }

    /// Create a TCP socket address
    pub fn tcp<S: Into<String>>(addr: S) -> Self {
        SocketAddr::Tcp(addr.into())
    }
}

impl std::fmt::Display for SocketAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(unix)]
            SocketAddr::Unix(path) => write!(f, "{}", path),
            SocketAddr::Tcp(addr) => write!(f, "{}", addr),
        }
    }
}

/// Internal enum for connection stream types
enum StreamInner {
    #[cfg(unix)]
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl StreamInner {
    fn connect(addr: &SocketAddr) -> std::io::Result<Self> {
        match addr {
            #[cfg(unix)]
            SocketAddr::Unix(path) => Ok(StreamInner::Unix(UnixStream::connect(path)?)),
            SocketAddr::Tcp(addr_str) => {
                let stream = TcpStream::connect(addr_str)?;
                // Single command bytes must not sit in Nagle's buffer
                stream.set_nodelay(true)?;
                Ok(StreamInner::Tcp(stream))
            }
        }
    }

    fn set_read_timeout(&self, dur: Option<Duration>) -> std::io::Result<()> {
        match self {
            #[cfg(unix)]
            StreamInner::Unix(s) => s.set_read_timeout(dur),
            StreamInner::Tcp(s) => s.set_read_timeout(dur),
        }
    }
}

impl Read for StreamInner {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            #[cfg(unix)]
            StreamInner::Unix(s) => s.read(buf),
            StreamInner::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for StreamInner {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            #[cfg(unix)]
            StreamInner::Unix(s) => s.write(buf),
            StreamInner::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            #[cfg(unix)]
            StreamInner::Unix(s) => s.flush(),
            StreamInner::Tcp(s) => s.flush(),
        }
    }
}

/// A device reachable over a socket. Every [`open`](LinkEndpoint::open)
/// makes a new connection.
#[derive(Debug, Clone)]
pub struct SocketEndpoint {
    addr: SocketAddr,
}

impl SocketEndpoint {
    pub fn new(addr: SocketAddr) -> Self {
        SocketEndpoint { addr }
    }

    pub fn addr(&self) -> &SocketAddr {
        &self.addr
    }
}

impl LinkEndpoint for SocketEndpoint {
    type Link = SocketLink;

    fn open(&mut self, timeout: Duration) -> Result<SocketLink, LinkError> {
        let open_err = |source| LinkError::Open {
            target: self.addr.to_string(),
            source,
        };
        let stream = StreamInner::connect(&self.addr).map_err(open_err)?;
        stream
            .set_read_timeout(Some(timeout.max(MIN_READ_TIMEOUT)))
            .map_err(open_err)?;
        log::trace!("[LINK] connected to {} (timeout {:?})", self.addr, timeout);
        Ok(SocketLink { stream })
    }
}

/// Host side of a socket link. The connection is closed on drop.
pub struct SocketLink {
    stream: StreamInner,
}

impl Link for SocketLink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        log::trace!("[LINK] -> {} bytes: {}", bytes.len(), fmt_bytes(bytes));
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<Option<Line>, LinkError> {
        read_line(&mut self.stream, Eof::Closed)
    }
}

/// Internal enum for listener types
enum ListenerInner {
    #[cfg(unix)]
    Unix(UnixListener),
    Tcp(TcpListener),
}

/// A socket listener that accepts connections (device side)
pub struct SocketListener {
    inner: ListenerInner,
    addr: SocketAddr,
}

impl SocketListener {
    /// Bind to a socket address and start listening
    pub fn bind(addr: &SocketAddr) -> Result<Self, std::io::Error> {
        let inner = match addr {
            #[cfg(unix)]
            SocketAddr::Unix(path) => {
                // Remove existing socket file if present
                let _ = std::fs::remove_file(path);
                ListenerInner::Unix(UnixListener::bind(path)?)
            }
            SocketAddr::Tcp(addr_str) => ListenerInner::Tcp(TcpListener::bind(addr_str)?),
        };
        Ok(SocketListener {
            inner,
            addr: addr.clone(),
        })
    }

    /// Accept a new connection (blocking)
    pub fn accept(&self) -> Result<DeviceConnection, std::io::Error> {
        let stream = match &self.inner {
            #[cfg(unix)]
            ListenerInner::Unix(listener) => StreamInner::Unix(listener.accept()?.0),
            ListenerInner::Tcp(listener) => {
                let (stream, _) = listener.accept()?;
                stream.set_nodelay(true)?;
                StreamInner::Tcp(stream)
            }
        };
        Ok(DeviceConnection { stream })
    }

    /// Get the address this listener is bound to
    pub fn addr(&self) -> &SocketAddr {
        &self.addr
    }
}

#[cfg(unix)]
impl Drop for SocketListener {
    fn drop(&mut self) {
        // Clean up Unix socket file on drop
        if let SocketAddr::Unix(path) = &self.addr {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Device side of an accepted connection: raw bytes in, reply bytes out
pub struct DeviceConnection {
    stream: StreamInner,
}

impl DeviceConnection {
    /// Read whatever bytes are available (blocking). An empty result means
    /// the host closed the link.
    pub fn recv(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut buf = [0u8; 256];
        loop {
            match self.stream.read(&mut buf) {
                Ok(n) => return Ok(buf[..n].to_vec()),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e)),
            }
        }
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    #[cfg(unix)]
    fn test_unix_socket_line_exchange() {
        let socket_path = "/tmp/amaze-test-socket.sock";
        let addr = SocketAddr::unix(socket_path);
        let listener = SocketListener::bind(&addr).unwrap();

        let server_thread = thread::spawn(move || {
            let mut conn = listener.accept().unwrap();

            // Poll byte from the host
            assert_eq!(conn.recv().unwrap(), b"%".to_vec());
            conn.send(b"S\r\n").unwrap();

            // Host hangs up
            assert!(conn.recv().unwrap().is_empty());
        });

        let mut endpoint = SocketEndpoint::new(addr);
        {
            let mut link = endpoint.open(Duration::from_millis(500)).unwrap();
            link.send(b"%").unwrap();
            let line = link.recv_line().unwrap().unwrap();
            assert_eq!(line.as_str(), "S");
        }

        server_thread.join().unwrap();
    }

    #[test]
    fn test_tcp_read_times_out_without_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server_thread = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1];
            // Keep the connection open until the host is done
            let _ = stream.read(&mut buf);
        });

        let mut endpoint = SocketEndpoint::new(SocketAddr::tcp(format!("127.0.0.1:{}", port)));
        let mut link = endpoint.open(Duration::ZERO).unwrap();
        assert!(link.recv_line().unwrap().is_none());
        link.send(b"Q").unwrap();
        drop(link);

        server_thread.join().unwrap();
    }

    #[test]
    fn test_connect_failure_is_open_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut endpoint = SocketEndpoint::new(SocketAddr::tcp(format!("127.0.0.1:{}", port)));
        assert!(matches!(
            endpoint.open(Duration::from_millis(1)),
            Err(LinkError::Open { .. })
        ));
    }
}
