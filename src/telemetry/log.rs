//! Leveled log facade.
//!
//! Each severity has four entry points, all funnelling into [`LogFacade::log`]:
//!
//! | Method | Culture | Error |
//! |--------|---------|-------|
//! | `info(template, args)` | invariant | none |
//! | `info_with_culture(culture, template, args)` | given | none |
//! | `info_exception(error, template, args)` | invariant | attached |
//! | `info_exception_with_culture(culture, error, template, args)` | given | attached |
//!
//! `args` is anything implementing [`FormatArgs`]: `()`, a tuple of up to
//! three values, or a slice of [`Arg`](crate::telemetry::format::Arg).
//!
//! The message is always formatted before the minimum level is consulted, so
//! a broken template is reported even when the call would be suppressed.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::telemetry::error::LogError;
use crate::telemetry::format::{format_message, Culture, FormatArgs};
use crate::telemetry::severity::{LogLevel, SeverityLevel};
use crate::telemetry::sink::{Properties, TelemetrySink};

/// Property holding the formatted message on exception records
pub const MESSAGE_PROPERTY: &str = "message";
/// Property holding the source label on exception records
pub const SOURCE_PROPERTY: &str = "source";

/// Logger bound to one source label
pub struct LogFacade {
    source: String,
    minimum_level: AtomicU8,
    sink: Arc<dyn TelemetrySink>,
}

macro_rules! leveled {
    ($level:expr, $plain:ident, $with_culture:ident, $exception:ident, $exception_with_culture:ident) => {
        pub fn $plain(&self, template: &str, args: impl FormatArgs) -> Result<(), LogError> {
            self.log($level, None, None, template, args)
        }

        pub fn $with_culture(
            &self,
            culture: &Culture,
            template: &str,
            args: impl FormatArgs,
        ) -> Result<(), LogError> {
            self.log($level, Some(culture), None, template, args)
        }

        pub fn $exception(
            &self,
            error: &dyn std::error::Error,
            template: &str,
            args: impl FormatArgs,
        ) -> Result<(), LogError> {
            self.log($level, None, Some(error), template, args)
        }

        pub fn $exception_with_culture(
            &self,
            culture: &Culture,
            error: &dyn std::error::Error,
            template: &str,
            args: impl FormatArgs,
        ) -> Result<(), LogError> {
            self.log($level, Some(culture), Some(error), template, args)
        }
    };
}

impl LogFacade {
    pub fn new(source: impl Into<String>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self::with_minimum_level(source, sink, LogLevel::default())
    }

    pub fn with_minimum_level(
        source: impl Into<String>,
        sink: Arc<dyn TelemetrySink>,
        minimum_level: LogLevel,
    ) -> Self {
        Self {
            source: source.into(),
            minimum_level: AtomicU8::new(minimum_level.as_u8()),
            sink,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn minimum_level(&self) -> LogLevel {
        LogLevel::from_u8(self.minimum_level.load(Ordering::Relaxed))
    }

    pub fn set_minimum_level(&self, level: LogLevel) {
        self.minimum_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.minimum_level()
    }

    /// Format, gate, map, and forward a single log call.
    ///
    /// Emits a trace record, or an exception record when `error` is given.
    /// Returns `Ok(())` without contacting the sink when `level` is below the
    /// minimum level.
    pub fn log(
        &self,
        level: LogLevel,
        culture: Option<&Culture>,
        error: Option<&dyn std::error::Error>,
        template: &str,
        args: impl FormatArgs,
    ) -> Result<(), LogError> {
        let message = format_message(culture, template, &args.into_args())?;

        if !self.is_enabled(level) {
            trace!(source = %self.source, %level, "log call below minimum level");
            return Ok(());
        }

        let severity = SeverityLevel::from(level);
        match error {
            Some(error) => {
                let mut properties = Properties::new();
                properties.insert(MESSAGE_PROPERTY.to_string(), message);
                properties.insert(SOURCE_PROPERTY.to_string(), self.source.clone());
                self.sink.track_exception(error, Some(severity), &properties)?;
            }
            None => self.sink.track_trace(&message, severity)?,
        }
        Ok(())
    }

    leveled!(LogLevel::Debug, debug, debug_with_culture, debug_exception, debug_exception_with_culture);
    leveled!(LogLevel::Info, info, info_with_culture, info_exception, info_exception_with_culture);
    leveled!(LogLevel::Warn, warn, warn_with_culture, warn_exception, warn_exception_with_culture);
    leveled!(LogLevel::Error, error, error_with_culture, error_exception, error_exception_with_culture);
    leveled!(LogLevel::Fatal, fatal, fatal_with_culture, fatal_exception, fatal_exception_with_culture);
}

impl std::fmt::Debug for LogFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFacade")
            .field("source", &self.source)
            .field("minimum_level", &self.minimum_level())
            .finish_non_exhaustive()
    }
}
