//! Verbosity-gated output for rcc jobs.
//!
//! Three output levels:
//! - **Quiet** (`-q`): errors only
//! - **Default**: captured rcc output + errors
//! - **Verbose** (`-v`, manifest `verbosity`, or `VERBOSE` in the environment):
//!   everything, including rebuild reasons, the rcc command line, settings
//!   writes, touches and wrapper updates

use std::process::Command;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Output verbosity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only.
    Quiet = 0,
    /// Tool output and errors.
    Default = 1,
    /// Full diagnostics.
    Verbose = 2,
}

/// Global verbosity level, set once at startup.
static VERBOSITY: AtomicU8 = AtomicU8::new(1); // Default

/// Initialize the verbosity level for the current process.
pub fn init(quiet: bool, verbose: bool) {
    let level = if quiet {
        Verbosity::Quiet
    } else if verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Default
    };
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Raise the level to verbose unless quiet mode was requested.
///
/// Used for verbosity requests that come from the manifest or the
/// environment rather than the command line.
pub fn raise_to_verbose() {
    if !is_quiet() {
        VERBOSITY.store(Verbosity::Verbose as u8, Ordering::Relaxed);
    }
}

fn current() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Default,
    }
}

/// Returns `true` if verbose mode is active.
pub fn is_verbose() -> bool {
    current() == Verbosity::Verbose
}

/// Returns `true` if quiet mode is active.
pub fn is_quiet() -> bool {
    current() == Verbosity::Quiet
}

/// Print a message only when verbose mode is enabled.
///
/// Usage mirrors `println!`:
/// ```ignore
/// vprintln!("Touching {}", path.display());
/// ```
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            println!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// Print a message at default verbosity and above (suppressed in quiet mode).
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            println!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Print a `warning:` line to stderr at every verbosity level.
macro_rules! wprintln {
    ($($arg:tt)*) => {
        eprintln!("warning: {}", format_args!($($arg)*))
    };
}

pub(crate) use wprintln;

/// RAII timer that prints elapsed duration on drop when verbose mode is active.
///
/// ```ignore
/// let _t = Timer::start("rcc");
/// // ... run the generator ...
/// // prints "  rcc: 42ms" on drop
/// ```
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Begin timing a labeled operation.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            let elapsed = self.start.elapsed();
            println!("  {}: {:.1?}", self.label, elapsed);
        }
    }
}

/// Quote a path or argument for log output.
pub fn quoted(text: impl std::fmt::Display) -> String {
    format!("\"{text}\"")
}

/// Render a command line with every element quoted, for log output.
pub fn quoted_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| quoted(arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}
