//! Persistent request logs for long-running services
//!
//! Entries are appended to a JSONL file so they survive restarts and can be
//! served back over the `/logs` endpoint. All operations are async and
//! serialized through an internal lock; console echo can be silenced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::Level;

// Types and Data Structures
// =========================

/// Severity stored with each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Verbose,
  Info,
  Success,
  Warn,
  Error,
}

impl LogLevel {
  fn console_level(self) -> Level {
    match self {
      LogLevel::Verbose => Level::Verbose,
      LogLevel::Info => Level::Info,
      LogLevel::Success => Level::Success,
      LogLevel::Warn => Level::Warn,
      LogLevel::Error => Level::Error,
    }
  }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LogLevel::Verbose => "verbose",
      LogLevel::Info => "info",
      LogLevel::Success => "success",
      LogLevel::Warn => "warn",
      LogLevel::Error => "error",
    };
    f.write_str(name)
  }
}

impl FromStr for LogLevel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "verbose" => Ok(LogLevel::Verbose),
      "info" => Ok(LogLevel::Info),
      "success" => Ok(LogLevel::Success),
      "warn" | "warning" => Ok(LogLevel::Warn),
      "error" => Ok(LogLevel::Error),
      other => Err(format!("unknown log level '{other}'")),
    }
  }
}

/// Request context attached to an entry
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  /// Request ID for correlation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  /// HTTP method
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  /// Request path
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  /// Request duration in milliseconds
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,

  /// HTTP status code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
}

/// A structured log entry
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: LogLevel,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

struct LogFile {
  path: PathBuf,
  silent: bool,
}

/// Thread-safe JSONL log storage
#[derive(Clone)]
pub struct DaemonLogs {
  inner: Arc<Mutex<LogFile>>,
}

// File Operations
// ===============

impl LogFile {
  fn open(path: &Path, silent: bool) -> std::io::Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    // Create without truncating an existing log
    OpenOptions::new().create(true).append(true).open(path)?;

    Ok(Self { path: path.to_path_buf(), silent })
  }

  fn append(&self, entry: &LogEntry) -> std::io::Result<()> {
    let line = serde_json::to_string(entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    writeln!(file, "{line}")?;
    file.flush()
  }

  /// Most recent `limit` entries matching `level`, oldest first
  fn read(&self, limit: Option<usize>, level: Option<LogLevel>) -> std::io::Result<Vec<LogEntry>> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(std::fs::File::open(&self.path)?);
    let mut entries = Vec::new();

    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }

      // Malformed lines are skipped
      let Ok(entry) = serde_json::from_str::<LogEntry>(&line) else {
        continue;
      };

      if level.is_none_or(|wanted| entry.level == wanted) {
        entries.push(entry);
      }
    }

    entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    if let Some(limit) = limit {
      let skip = entries.len().saturating_sub(limit);
      entries.drain(..skip);
    }

    Ok(entries)
  }
}

// Core API
// ========

impl DaemonLogs {
  /// Open (or create) the log file at `path`
  pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    Self::new_with_silent(path, false)
  }

  /// Open the log file, optionally without echoing entries to the console
  pub fn new_with_silent<P: AsRef<Path>>(path: P, silent: bool) -> std::io::Result<Self> {
    let file = LogFile::open(path.as_ref(), silent)?;
    Ok(Self { inner: Arc::new(Mutex::new(file)) })
  }

  /// Append an entry, reporting write failures
  pub async fn record(
    &self,
    level: LogLevel,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level,
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    let guard = self.inner.lock().await;
    guard.append(&entry)?;
    if !guard.silent {
      crate::emit(level.console_level(), &format!("[{component}] {message}"));
    }
    Ok(())
  }

  /// Append an entry, ignoring write failures
  pub async fn log(&self, level: LogLevel, message: &str, component: &str) {
    let _ = self.record(level, message, component, None).await;
  }

  /// Append an entry with request context, ignoring write failures
  pub async fn log_with_context(
    &self,
    level: LogLevel,
    message: &str,
    component: &str,
    context: LogContext,
  ) {
    let _ = self.record(level, message, component, Some(context)).await;
  }

  /// Retrieve the most recent entries, optionally filtered by level
  pub async fn get_logs(
    &self,
    limit: Option<usize>,
    level: Option<LogLevel>,
  ) -> std::io::Result<Vec<LogEntry>> {
    let guard = self.inner.lock().await;
    guard.read(limit, level)
  }

  /// Path of the backing JSONL file
  pub async fn log_file_path(&self) -> PathBuf {
    self.inner.lock().await.path.clone()
  }
}

// Standard Logging Wrappers
// =========================

impl DaemonLogs {
  pub async fn info(&self, message: &str, component: &str) {
    self.log(LogLevel::Info, message, component).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    self.log(LogLevel::Success, message, component).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    self.log(LogLevel::Warn, message, component).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.log(LogLevel::Error, message, component).await;
  }

  pub async fn verbose(&self, message: &str, component: &str) {
    self.log(LogLevel::Verbose, message, component).await;
  }
}
