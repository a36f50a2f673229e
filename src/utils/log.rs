//! Colored stderr logger with level macros.
//!
//! Used by the interpreter for instruction tracing and by the compositions and
//! binaries for progress and failure reports.

use std::fmt::Display;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Log level of a message.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Trace => "TRACE",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        f.pad(name)
    }
}

impl Level {
    fn color_spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Level::Trace => {
                spec.set_fg(Some(Color::Cyan)).set_dimmed(true);
            }
            Level::Info => {}
            Level::Warn => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Level::Error => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
        }
        spec
    }
}

pub static SHOW_TIMESTAMP: AtomicBool = AtomicBool::new(true);
pub static SHOW_LEVEL: AtomicBool = AtomicBool::new(true);

/// Formats a duration since the Unix epoch as `HH:MM:SS.mmm` (UTC time of day).
fn time_of_day(secs: u64, millis: u32) -> String {
    let hours = (secs / 3600) % 24;
    let mins = (secs / 60) % 60;
    let s = secs % 60;
    format!("{hours:02}:{mins:02}:{s:02}.{millis:03}")
}

/// Writes one log line. Use the `trace!`, `info!`, `warn!` or `error!` macros instead.
#[doc(hidden)]
pub fn log(level: Level, message: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(&level.color_spec());

    if SHOW_TIMESTAMP.load(Ordering::Relaxed) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let _ = write!(stderr, "{} ", time_of_day(now.as_secs(), now.subsec_millis()));
    }
    if SHOW_LEVEL.load(Ordering::Relaxed) {
        let _ = write!(stderr, "[{:5}] ", level);
    }
    let _ = writeln!(stderr, "{}", message);
    let _ = stderr.reset();
}

/// Logs a trace-level message (instruction-by-instruction interpreter output).
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Trace, &format!($($arg)*))
        }
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Info, &format!($($arg)*))
        }
    }};
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Warn, &format!($($arg)*))
        }
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Error, &format!($($arg)*))
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Trace < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_display_pads() {
        assert_eq!(format!("{}", Level::Trace), "TRACE");
        assert_eq!(format!("{:5}", Level::Info), "INFO ");
        assert_eq!(format!("{:5}", Level::Warn), "WARN ");
    }

    #[test]
    fn time_of_day_epoch() {
        assert_eq!(time_of_day(0, 0), "00:00:00.000");
    }

    #[test]
    fn time_of_day_wraps_days() {
        // 2024-01-01 13:45:07.250 UTC
        assert_eq!(time_of_day(1_704_116_707, 250), "13:45:07.250");
    }

    #[test]
    fn macros_are_silent_in_tests() {
        crate::trace!("pc={}", 0);
        crate::info!("hello");
        crate::warn!("careful");
        crate::error!("boom");
    }
}
