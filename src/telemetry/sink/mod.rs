//! The ingestion backend boundary.
//!
//! [`TelemetrySink`] is the only surface the facade and the feature usage
//! sessions talk to. Delivery guarantees (batching, retry, storage) belong to
//! the implementation, not to the callers.
//!
//! # Implementations
//!
//! - [`OtelSink`]: forwards onto an OpenTelemetry tracer
//! - [`JsonLinesSink`]: one JSON record per line on any writer
//! - [`MemorySink`]: keeps records in memory (tests, embedding)

mod json;
mod memory;
mod otel;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::telemetry::error::SinkError;
use crate::telemetry::severity::SeverityLevel;

pub use json::JsonLinesSink;
pub use memory::MemorySink;
pub use otel::OtelSink;

/// Key/value properties attached to events and exceptions
pub type Properties = BTreeMap<String, String>;

/// Backend capable of recording events, traces, and exceptions.
///
/// Implementations must be safe to call from several threads at once.
pub trait TelemetrySink: Send + Sync {
    /// Record a named event
    fn track_event(&self, name: &str, properties: &Properties) -> Result<(), SinkError>;

    /// Record a plain trace message
    fn track_trace(&self, message: &str, severity: SeverityLevel) -> Result<(), SinkError>;

    /// Record an error, optionally with a severity
    fn track_exception(
        &self,
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Result<(), SinkError>;
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Arc<S> {
    fn track_event(&self, name: &str, properties: &Properties) -> Result<(), SinkError> {
        (**self).track_event(name, properties)
    }

    fn track_trace(&self, message: &str, severity: SeverityLevel) -> Result<(), SinkError> {
        (**self).track_trace(message, severity)
    }

    fn track_exception(
        &self,
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Result<(), SinkError> {
        (**self).track_exception(error, severity, properties)
    }
}

/// Owned description of an error and its `source()` chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionDetails {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ExceptionDetails {
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            message: error.to_string(),
            causes,
        }
    }
}

/// One delivered record, as stored by [`MemorySink`] and written by
/// [`JsonLinesSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRecord {
    Event {
        name: String,
        properties: Properties,
    },
    Trace {
        message: String,
        severity: SeverityLevel,
    },
    Exception {
        exception: ExceptionDetails,
        #[serde(skip_serializing_if = "Option::is_none")]
        severity: Option<SeverityLevel>,
        properties: Properties,
    },
}

impl TelemetryRecord {
    pub fn event(name: &str, properties: &Properties) -> Self {
        Self::Event {
            name: name.to_string(),
            properties: properties.clone(),
        }
    }

    pub fn trace(message: &str, severity: SeverityLevel) -> Self {
        Self::Trace {
            message: message.to_string(),
            severity,
        }
    }

    pub fn exception(
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Self {
        Self::Exception {
            exception: ExceptionDetails::from_error(error),
            severity,
            properties: properties.clone(),
        }
    }

    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Self::Event { properties, .. } | Self::Exception { properties, .. } => Some(properties),
            Self::Trace { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn exception_details_walk_source_chain() {
        let details = ExceptionDetails::from_error(&Outer(Inner));

        assert_eq!(details.message, "outer");
        assert_eq!(details.causes, vec!["inner".to_string()]);
    }

    #[test]
    fn record_serializes_with_kind_tag() {
        let record = TelemetryRecord::trace("hello", SeverityLevel::Warning);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["kind"], "trace");
        assert_eq!(json["message"], "hello");
        assert_eq!(json["severity"], "Warning");
    }

    #[test]
    fn properties_only_on_events_and_exceptions() {
        let mut properties = Properties::new();
        properties.insert("Name".to_string(), "export".to_string());

        let event = TelemetryRecord::event("FeatureUsage.Start", &properties);
        let exception = TelemetryRecord::exception(&Outer(Inner), None, &properties);
        let trace = TelemetryRecord::trace("hello", SeverityLevel::Verbose);

        assert_eq!(event.properties(), Some(&properties));
        assert_eq!(exception.properties(), Some(&properties));
        assert_eq!(trace.properties(), None);
    }

    #[test]
    fn arc_sink_forwards() {
        let sink = Arc::new(MemorySink::new());
        let shared: Arc<dyn TelemetrySink> = sink.clone();

        shared.track_trace("via arc", SeverityLevel::Verbose).unwrap();

        assert_eq!(sink.records(), vec![TelemetryRecord::trace("via arc", SeverityLevel::Verbose)]);
    }
}
