//! Logger backend for the `log` facade that writes to stderr or a file.

use crate::parse_args::Verbosity;
use log::{Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

/// Output destination for logger
enum Output {
    Stderr,
    File(BufWriter<File>),
}

pub struct Logger {
    output: Mutex<Output>,
    verbosity: Verbosity,
}

impl Logger {
    /// Create a new logger writing to stderr
    pub fn stderr(verbosity: Verbosity) -> Self {
        Logger {
            output: Mutex::new(Output::Stderr),
            verbosity,
        }
    }

    /// Create a new logger writing to a file
    pub fn file(path: &str, verbosity: Verbosity) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Logger {
            output: Mutex::new(Output::File(BufWriter::new(file))),
            verbosity,
        })
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Make this the global `log` backend
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.verbosity.level_filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.verbosity.level_filter()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut output) = self.output.lock() {
            match &mut *output {
                Output::Stderr => {
                    eprintln!("{}", record.args());
                }
                Output::File(f) => {
                    let now = chrono::Local::now().format("%H:%M:%S%.3f");
                    let _ = writeln!(f, "{} {:<5} {}", now, record.level(), record.args());
                    let _ = f.flush();
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut output) = self.output.lock() {
            if let Output::File(f) = &mut *output {
                let _ = f.flush();
            }
        }
    }
}
