//! Bentley - console logging for canvass services
//!
//! ## Features
//!
//! - Leveled stderr logging (verbose, debug, info, success, warn, error)
//! - Multi-line messages keep the level prefix on every line
//! - `format!`-style macros for every level
//! - Banner announcements for startup messages
//! - Persistent JSONL request logs behind the `daemon-logs` feature

use colored::*;

#[cfg(feature = "daemon-logs")]
pub mod daemon_logs;

/// Console log levels, ordered from noisiest to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  /// Short tag printed inside the prefix brackets
  pub fn tag(self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "sccs",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  fn color(self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Debug => Color::Magenta,
      Level::Info => Color::Blue,
      Level::Success => Color::Green,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
    }
  }
}

/// Write raw lines to stderr
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Build the padded, colored `[tag]` prefix for a level
pub fn format_prefix(level: Level) -> String {
  let tag = level.tag();
  let padding = 7usize.saturating_sub(tag.len() + 2);
  format!("[{}]{:<padding$}", tag.color(level.color()).bold(), "")
}

/// Prefix every line of `message` and write it to stderr
pub fn emit(level: Level, message: &str) {
  let prefix = format_prefix(level);
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

pub fn debug(message: &str) {
  emit(Level::Debug, message);
}

/// General information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Something completed successfully
pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// Something needs attention
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

/// Something went wrong
pub fn error(message: &str) {
  emit(Level::Error, message);
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, border: char) -> String {
  border.to_string().repeat(length)
}

/// Display a message framed by banner lines, sized to the longest line
pub fn announce(message: &str) {
  let width = message.lines().map(|line| line.chars().count()).max().unwrap_or(0).max(40);
  let banner = banner_line(width, '-');

  log(&banner.blue().bold().to_string());
  for line in message.lines() {
    log(&line.blue().bold().to_string());
  }
  log(&banner.blue().bold().to_string());
}

/// Macros accept `format!` arguments
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => {
    $crate::debug(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*))
  };
}
