mod logger;
mod parse_args;

use amaze_protocol::socket::DEFAULT_SOCKET_PATH;
use amaze_protocol::{DeviceConnection, DeviceModel, LinkError, SocketAddr, SocketListener};
use log::{debug, info, trace, warn};
use logger::Logger;
use parse_args::parse_args;
use rand::Rng;

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = Logger::new(args.verbosity).install() {
        eprintln!("Failed to install logger: {}", e);
    }

    // Determine socket address
    let addr = if let Some(tcp) = &args.tcp_addr {
        SocketAddr::tcp(tcp.clone())
    } else {
        let path = args
            .socket_path
            .clone()
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());
        #[cfg(unix)]
        {
            SocketAddr::unix(&path)
        }
        #[cfg(not(unix))]
        {
            eprintln!("Unix sockets not supported on this platform, use --tcp ({})", path);
            std::process::exit(1);
        }
    };

    let listener = match SocketListener::bind(&addr) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to listen on {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    eprintln!("Maze display emulator listening on {}", listener.addr());

    let mut device = DeviceModel::with_boot_polls(args.boot_polls);
    let mut rng = rand::thread_rng();

    // The host opens a new connection for every operation
    loop {
        let mut conn = match listener.accept() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Accept failed: {}", e);
                continue;
            }
        };
        if args.auto_reset && device.is_finished() {
            info!("[DEVICE] previous game finished, resetting");
            device.reset();
        }
        debug!("[DEVICE] host connected in {:?}", device.phase());

        match serve(&mut conn, &mut device, args.drop_rate, &mut rng) {
            Ok(()) => debug!("[DEVICE] host disconnected"),
            Err(e) => warn!("[DEVICE] connection error: {}", e),
        }
    }
}

/// Answer the host until it closes the connection
fn serve<R: Rng>(
    conn: &mut DeviceConnection,
    device: &mut DeviceModel,
    drop_rate: f64,
    rng: &mut R,
) -> Result<(), LinkError> {
    loop {
        let bytes = conn.recv()?;
        if bytes.is_empty() {
            return Ok(());
        }
        let finished_before = device.is_finished();
        let moves_before = device.moves().len();
        device.feed(&bytes);

        if device.moves().len() > moves_before {
            info!("[DEVICE] cursor at {}", device.cursor());
        }
        if device.is_finished() && !finished_before {
            info!("[DEVICE] game over after {} moves", device.moves().len());
        }

        let reply = lossy(device.take_output(), drop_rate, rng);
        if !reply.is_empty() {
            conn.send(&reply)?;
        }
    }
}

/// Drop whole reply lines with probability `drop_rate`
fn lossy<R: Rng>(output: Vec<u8>, drop_rate: f64, rng: &mut R) -> Vec<u8> {
    if drop_rate <= 0.0 {
        return output;
    }
    let kept: Vec<u8> = output
        .split_inclusive(|&b| b == b'\n')
        .filter(|line| {
            let keep = !rng.gen_bool(drop_rate);
            if !keep {
                trace!("[DEVICE] dropped reply {:?}", String::from_utf8_lossy(line));
            }
            keep
        })
        .flatten()
        .copied()
        .collect();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_lossy_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        let output = b"S\r\n*\r\n".to_vec();
        assert_eq!(lossy(output.clone(), 0.0, &mut rng), output);
        assert!(lossy(output, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_lossy_keeps_whole_lines() {
        let mut rng = StdRng::seed_from_u64(42);
        let output = b"Q\r\n".repeat(50);
        let kept = lossy(output, 0.5, &mut rng);
        assert_eq!(kept.len() % 3, 0);
        assert!(kept.chunks(3).all(|c| c == b"Q\r\n"));
    }
}
