const HELP: &str = "\
Amaze device CLI - maze display emulator

Listens for the host on a socket and answers like the display firmware.
The emulated board keeps its state across connections.

USAGE:
  amaze-device-cli [OPTIONS]

OPTIONS:
  -h, --help            Prints help information
  --socket <path>       Unix socket path (default: /tmp/amaze-device.sock)
  --tcp <host:port>     Listen on TCP instead of a Unix socket
  --boot-polls <n>      Answer the first n polls with a busy line
  --drop-rate <p>       Probability of losing each reply (0.0 - 1.0).
                        The board never repeats a reply: a lost `*` leaves
                        the host retransmitting until its --max-move-tries
                        runs out, and a lost `S` stalls the host for good
  --auto-reset          Reset the board when a finished game is reconnected
  -v, --verbose         Show connection and game events
  -vv, --trace          Show device state changes
  -vvv, --trace-uart    Show individual bytes (very verbose)
";

/// Verbosity level for debug output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Quiet = 0,
    Verbose = 1,
    Trace = 2,
    TraceUart = 3,
}

#[derive(Debug)]
pub struct AppArgs {
    pub socket_path: Option<String>,
    pub tcp_addr: Option<String>,
    pub boot_polls: u32,
    pub drop_rate: f64,
    pub auto_reset: bool,
    pub verbosity: Verbosity,
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
        socket_path: pargs.opt_value_from_str("--socket")?,
        tcp_addr: pargs.opt_value_from_str("--tcp")?,
        boot_polls: pargs.opt_value_from_str("--boot-polls")?.unwrap_or(0),
        drop_rate: pargs
            .opt_value_from_fn("--drop-rate", parse_drop_rate)?
            .unwrap_or(0.0),
        auto_reset: pargs.contains("--auto-reset"),
        verbosity,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}

/// A probability clamped to 0..=1. NaN and infinities are rejected.
fn parse_drop_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("invalid drop rate {:?}: {}", s, e))?;
    if !rate.is_finite() {
        return Err(format!("drop rate must be a number between 0 and 1, got {}", s));
    }
    Ok(rate.clamp(0.0, 1.0))
}
