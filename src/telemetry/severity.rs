//! Log levels accepted by the facade and the backend severities they map to.
//!
//! [`SeverityLevel::from`] is the only place a [`LogLevel`] is translated;
//! every facade call path goes through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::telemetry::error::TelemetryError;

/// Ordered log importance: `Debug < Info < Warn < Error < Fatal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            3 => Self::Error,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" | "verbose" => Ok(Self::Debug),
            "info" | "information" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" | "critical" => Ok(Self::Fatal),
            other => Err(TelemetryError::Config(format!("unknown log level '{}'", other))),
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::INFO => Self::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Self::Debug,
        }
    }
}

/// Severity values understood by the ingestion backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    Verbose,
    Information,
    Warning,
    Error,
    Critical,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
        }
    }

    /// Numeric value as used by the backend wire format (0..=4)
    pub fn value(&self) -> i64 {
        *self as i64
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for SeverityLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::Verbose,
            LogLevel::Info => Self::Information,
            LogLevel::Warn => Self::Warning,
            LogLevel::Error => Self::Error,
            LogLevel::Fatal => Self::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table_is_canonical() {
        let expected = [
            (LogLevel::Debug, SeverityLevel::Verbose),
            (LogLevel::Info, SeverityLevel::Information),
            (LogLevel::Warn, SeverityLevel::Warning),
            (LogLevel::Error, SeverityLevel::Error),
            (LogLevel::Fatal, SeverityLevel::Critical),
        ];

        for (level, severity) in expected {
            assert_eq!(SeverityLevel::from(level), severity, "{level}");
        }
    }

    // Some legacy overloads sent Fatal as Information or Error.
    #[test]
    fn fatal_maps_to_critical_only() {
        let severity = SeverityLevel::from(LogLevel::Fatal);

        assert_ne!(severity, SeverityLevel::Information);
        assert_ne!(severity, SeverityLevel::Error);
        assert_eq!(severity, SeverityLevel::Critical);
    }

    #[test]
    fn mapping_preserves_order() {
        let severities: Vec<_> = LogLevel::ALL.iter().map(|l| SeverityLevel::from(*l)).collect();
        let mut sorted = severities.clone();
        sorted.sort();

        assert_eq!(severities, sorted);
    }

    #[test]
    fn log_level_parses_aliases() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("critical".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert_eq!(" info ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_u8_round_trips() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_u8(level.as_u8()), level);
        }
    }

    #[test]
    fn severity_values_match_backend() {
        assert_eq!(SeverityLevel::Verbose.value(), 0);
        assert_eq!(SeverityLevel::Critical.value(), 4);
    }
}
