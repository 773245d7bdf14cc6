// Operational log domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(id: String, timestamp: i64, level: LogLevel, message: String) -> Self {
        Self {
            id,
            timestamp,
            level,
            message,
        }
    }
}

/// Level predicate used when querying the log: everything, or one exact level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    pub fn matches(&self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => *wanted == level,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level filter: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for LevelFilter {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ALL" => Ok(LevelFilter::All),
            "INFO" => Ok(LevelFilter::Only(LogLevel::Info)),
            "WARN" | "WARNING" => Ok(LevelFilter::Only(LogLevel::Warn)),
            "ERROR" => Ok(LevelFilter::Only(LogLevel::Error)),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
