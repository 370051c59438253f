use thiserror::Error;

/// Errors raised while bootstrapping the telemetry pipeline
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Exporter error: {0}")]
    Exporter(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl From<opentelemetry_otlp::ExporterBuildError> for TelemetryError {
    fn from(err: opentelemetry_otlp::ExporterBuildError) -> Self {
        Self::Exporter(err.to_string())
    }
}

/// Message template and argument mismatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("placeholder {{{index}}} references a missing argument ({supplied} supplied)")]
    MissingArgument { index: usize, supplied: usize },
    #[error("unbalanced brace at position {position}")]
    UnbalancedBrace { position: usize },
    #[error("malformed placeholder at position {position}")]
    InvalidPlaceholder { position: usize },
    #[error("format specifier '{spec}' is not valid for argument {index}")]
    InvalidSpecifier { index: usize, spec: String },
}

/// The sink rejected or failed to accept an event
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink rejected event: {0}")]
    Rejected(String),
    #[error("sink I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("sink lock poisoned")]
    Poisoned,
}

/// Failure of a single leveled log call
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_message_names_index() {
        let err = FormatError::MissingArgument {
            index: 2,
            supplied: 1,
        };

        assert_eq!(
            err.to_string(),
            "placeholder {2} references a missing argument (1 supplied)"
        );
    }

    #[test]
    fn log_error_wraps_format_error_transparently() {
        let err: LogError = FormatError::UnbalancedBrace { position: 4 }.into();

        assert_eq!(err.to_string(), "unbalanced brace at position 4");
        assert!(matches!(err, LogError::Format(_)));
    }

    #[test]
    fn sink_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: SinkError = io.into();

        assert!(err.to_string().starts_with("sink I/O failure"));
    }
}
