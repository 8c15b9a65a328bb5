//! Explicit logger context for the protocol engine
//!
//! The engine never touches process-wide logger state of its own. Callers
//! create a [`StreamLogger`] per session and pass it by `&mut` into the
//! entry points that can emit diagnostics. Records are forwarded to the
//! `log` facade under the logger's target, counted per level, and
//! optionally kept in a bounded in-memory capture for offline analysis.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default log target for engine diagnostics
pub const DEFAULT_TARGET: &str = "tn3270r::stream";

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Logging section of the engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Target name passed to the `log` facade
    pub target: String,
    /// Maximum level forwarded ("off", "error", "warn", "info", "debug", "trace")
    pub level: String,
    /// Number of records kept in memory (0 disables capture)
    pub capture_limit: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            level: "debug".to_string(),
            capture_limit: 0,
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level
    pub fn level_filter(&self) -> ConfigResult<LevelFilter> {
        LevelFilter::from_str(&self.level).map_err(|_| ConfigError::InvalidParameter {
            parameter: "logging.level".to_string(),
            value: self.level.clone(),
            reason: "expected one of off, error, warn, info, debug, trace".to_string(),
        })
    }
}

/// Per-session logger context
#[derive(Debug)]
pub struct StreamLogger {
    target: String,
    filter: LevelFilter,
    capture_limit: usize,
    captured: VecDeque<LogRecord>,
    counts: [u64; 5],
}

impl StreamLogger {
    /// Create a logger forwarding everything up to `debug` under `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            filter: LevelFilter::Debug,
            capture_limit: 0,
            captured: VecDeque::new(),
            counts: [0; 5],
        }
    }

    /// Build a logger from configuration
    pub fn from_config(config: &LoggingConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.target.clone())
            .with_level(config.level_filter()?)
            .with_capture(config.capture_limit))
    }

    /// Set the maximum level forwarded
    pub fn with_level(mut self, filter: LevelFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Keep the last `limit` records in memory
    pub fn with_capture(mut self, limit: usize) -> Self {
        self.capture_limit = limit;
        self.captured = VecDeque::with_capacity(limit.min(1024));
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn level(&self) -> LevelFilter {
        self.filter
    }

    /// Whether a record at `level` would be emitted
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.filter
    }

    /// Emit a record at `level`
    pub fn log(&mut self, level: Level, message: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        self.counts[level as usize - 1] += 1;

        log::log!(target: self.target.as_str(), level, "{}", message);

        if self.capture_limit > 0 {
            if self.captured.len() == self.capture_limit {
                self.captured.pop_front();
            }
            self.captured.push_back(LogRecord {
                level,
                message: message.to_string(),
            });
        }
    }

    pub fn error(&mut self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    pub fn warn(&mut self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn info(&mut self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn debug(&mut self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    pub fn trace(&mut self, message: impl fmt::Display) {
        self.log(Level::Trace, message);
    }

    /// Number of records emitted at `level`
    pub fn count(&self, level: Level) -> u64 {
        self.counts[level as usize - 1]
    }

    /// Captured records, oldest first
    pub fn captured(&self) -> impl Iterator<Item = &LogRecord> {
        self.captured.iter()
    }

    /// Drain the capture buffer
    pub fn take_captured(&mut self) -> Vec<LogRecord> {
        self.captured.drain(..).collect()
    }
}

impl Default for StreamLogger {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}
