mod logger;
mod parse_args;
mod session;

use amaze_protocol::{
    available_ports, DeviceModel, EmulatedEndpoint, Handshake, LinkEndpoint, ProtocolConfig,
    SerialEndpoint, SocketAddr, SocketEndpoint,
};
use logger::Logger;
use parse_args::{parse_args, AppArgs};
use session::{load_maze, run_session, Ending, SessionError, SessionReport};

use std::io;

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    // Set up logger
    let logger = match &args.log_file {
        Some(path) => match Logger::file(path, args.verbosity) {
            Ok(l) => {
                eprintln!("Logging to: {}", path);
                l
            }
            Err(e) => {
                eprintln!("Failed to open log file '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => Logger::stderr(args.verbosity),
    };
    let verbosity = logger.verbosity();
    if let Err(e) = logger.install() {
        eprintln!("Failed to install logger: {}", e);
    }
    log::debug!("Verbosity: {:?}", verbosity);

    if args.list_ports {
        match available_ports() {
            Ok(ports) if ports.is_empty() => println!("No serial ports found"),
            Ok(ports) => ports.iter().for_each(|p| println!("{}", p)),
            Err(e) => {
                eprintln!("Could not list serial ports: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let Some(maze_path) = &args.maze else {
        eprintln!("No maze given, use --maze <file> (see --help)");
        std::process::exit(1);
    };
    let rows = match load_maze(maze_path) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Could not read maze '{}': {}", maze_path.display(), e);
            std::process::exit(1);
        }
    };

    let result = if args.emulate {
        let device = DeviceModel::with_boot_polls(args.boot_polls);
        play(EmulatedEndpoint::new(device), ProtocolConfig::immediate(), &rows, &args)
    } else if let Some(tcp) = &args.tcp_addr {
        play(SocketEndpoint::new(SocketAddr::tcp(tcp.clone())), ProtocolConfig::default(), &rows, &args)
    } else if let Some(path) = &args.socket_path {
        #[cfg(unix)]
        {
            play(SocketEndpoint::new(SocketAddr::unix(path)), ProtocolConfig::default(), &rows, &args)
        }
        #[cfg(not(unix))]
        {
            eprintln!("Unix sockets not supported on this platform, use --tcp ({})", path);
            std::process::exit(1);
        }
    } else {
        let endpoint = SerialEndpoint::new(args.port.clone(), args.baud);
        eprintln!("Connecting to {}...", endpoint);
        play(endpoint, ProtocolConfig::default(), &rows, &args)
    };

    match result {
        Ok(report) => print_report(&report),
        Err(SessionError::Protocol(e)) if e.is_link_failure() => {
            eprintln!("Link error: {}", e);
            eprintln!("Reset the device and run again.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Game error: {}", e);
            std::process::exit(1);
        }
    }
}

fn play<E: LinkEndpoint>(
    endpoint: E,
    mut config: ProtocolConfig,
    rows: &[String],
    args: &AppArgs,
) -> Result<SessionReport, SessionError> {
    config.max_ready_attempts = args.max_ready_polls;
    config.max_move_attempts = args.max_move_tries;
    let mut hs = Handshake::with_config(endpoint, config);

    eprintln!("Sending maze ({} rows)...", rows.len());
    let stdin = io::stdin();
    run_session(&mut hs, rows, args.start, stdin.lock())
}

fn print_report(report: &SessionReport) {
    match report.ending {
        Ending::Escaped => println!("You escaped the maze!"),
        Ending::Abandoned => println!("Game abandoned."),
        Ending::InputClosed => println!("Out of moves."),
    }
    println!(
        "Final position {} after {} moves ({} blocked), time: {:.2}s",
        report.position,
        report.moves_sent,
        report.moves_blocked,
        report.elapsed.as_secs_f64()
    );
}
