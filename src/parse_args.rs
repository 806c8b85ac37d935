use amaze_protocol::{Position, DEFAULT_BAUD, DEFAULT_SERIAL_PORT, START_POSITION};
use std::path::PathBuf;

const HELP: &str = "\
Amaze - maze display host

Sends a maze to the display board, then plays it with moves read from stdin.
Moves are the symbols U, D, L, R (and O to leave early), separated by
whitespace or newlines.

USAGE:
  amaze --maze <file> [OPTIONS]

OPTIONS:
  -h, --help              Prints help information
  --maze <file>           Maze text file, one row per line
  --port <path>           Serial device (default: /dev/ttyACM0)
  --baud <rate>           Baud rate (default: 9600)
  --tcp <host:port>       Talk to the device through a TCP bridge instead
  --socket <path>         Talk to the device through a Unix socket instead
  --emulate               Play against a built-in device model
  --boot-polls <n>        Polls the built-in device ignores while booting
  --start <x,y>           Starting position (default: 0,1)
  --max-ready-polls <n>   Give up waiting for the device after sending n polls
  --max-move-tries <n>    Give up on a move after n transmissions
  --list-ports            List serial ports and exit
  -v, --verbose           Show connection and protocol events
  -vv, --trace            Show handshake state changes
  -vvv, --trace-uart      Show every byte on the link (very verbose)
  --log <file>            Write trace output to file instead of stderr
";

/// Verbosity level for debug output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings only
    #[default]
    Quiet = 0,
    /// Completed operations
    Verbose = 1,
    /// State changes, retries
    Trace = 2,
    /// Individual link bytes
    TraceUart = 3,
}

impl Verbosity {
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Warn,
            Verbosity::Verbose => log::LevelFilter::Info,
            Verbosity::Trace => log::LevelFilter::Debug,
            Verbosity::TraceUart => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug)]
pub struct AppArgs {
    pub maze: Option<PathBuf>,
    pub port: String,
    pub baud: u32,
    pub tcp_addr: Option<String>,
    pub socket_path: Option<String>,
    pub emulate: bool,
    pub boot_polls: u32,
    pub start: Position,
    pub max_ready_polls: Option<u32>,
    pub max_move_tries: Option<u32>,
    pub list_ports: bool,
    pub verbosity: Verbosity,
    pub log_file: Option<String>,
}

pub fn parse_args() -> Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    // Count -v flags for verbosity level
    let verbosity = if pargs.contains("--trace-uart") || pargs.contains("-vvv") {
        Verbosity::TraceUart
    } else if pargs.contains("--trace") || pargs.contains("-vv") {
        Verbosity::Trace
    } else if pargs.contains(["-v", "--verbose"]) {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    let args = AppArgs {
        maze: pargs.opt_value_from_str("--maze")?,
        port: pargs
            .opt_value_from_str("--port")?
            .unwrap_or_else(|| DEFAULT_SERIAL_PORT.to_string()),
        baud: pargs.opt_value_from_str("--baud")?.unwrap_or(DEFAULT_BAUD),
        tcp_addr: pargs.opt_value_from_str("--tcp")?,
        socket_path: pargs.opt_value_from_str("--socket")?,
        emulate: pargs.contains("--emulate"),
        boot_polls: pargs.opt_value_from_str("--boot-polls")?.unwrap_or(0),
        start: pargs.opt_value_from_str("--start")?.unwrap_or(START_POSITION),
        max_ready_polls: pargs.opt_value_from_str("--max-ready-polls")?,
        max_move_tries: pargs.opt_value_from_str("--max-move-tries")?,
        list_ports: pargs.contains("--list-ports"),
        verbosity,
        log_file: pargs.opt_value_from_str("--log")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}
