use opentelemetry::trace::{Span, SpanKind, Status, Tracer};
use opentelemetry::KeyValue;

use crate::telemetry::error::SinkError;
use crate::telemetry::severity::SeverityLevel;
use crate::telemetry::sink::{Properties, TelemetrySink};

/// Span name used for plain trace messages
pub const TRACE_SPAN_NAME: &str = "trace";
/// Span name used for exception records
pub const EXCEPTION_SPAN_NAME: &str = "exception";

pub const MESSAGE_ATTRIBUTE: &str = "message";
pub const SEVERITY_ATTRIBUTE: &str = "severity";
pub const SEVERITY_LEVEL_ATTRIBUTE: &str = "severity.level";

/// Sink that records every call as a short-lived OpenTelemetry span.
///
/// - events become a span named after the event, properties as attributes
/// - traces become a `trace` span with message and severity attributes
/// - exceptions become an `exception` span carrying the recorded error and
///   an error status
///
/// Export happens in the tracer provider's processor; this sink never fails.
pub struct OtelSink<T: Tracer> {
    tracer: T,
}

impl<T: Tracer> OtelSink<T> {
    pub fn new(tracer: T) -> Self {
        Self { tracer }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }
}

fn property_attributes(properties: &Properties) -> impl Iterator<Item = KeyValue> + '_ {
    properties
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
}

fn severity_attributes(severity: SeverityLevel) -> [KeyValue; 2] {
    [
        KeyValue::new(SEVERITY_ATTRIBUTE, severity.as_str()),
        KeyValue::new(SEVERITY_LEVEL_ATTRIBUTE, severity.value()),
    ]
}

impl<T> TelemetrySink for OtelSink<T>
where
    T: Tracer + Send + Sync,
{
    fn track_event(&self, name: &str, properties: &Properties) -> Result<(), SinkError> {
        let mut span = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(SpanKind::Internal)
            .with_attributes(property_attributes(properties).collect::<Vec<_>>())
            .start(&self.tracer);
        span.end();
        Ok(())
    }

    fn track_trace(&self, message: &str, severity: SeverityLevel) -> Result<(), SinkError> {
        let mut attributes = vec![KeyValue::new(MESSAGE_ATTRIBUTE, message.to_string())];
        attributes.extend(severity_attributes(severity));

        let mut span = self
            .tracer
            .span_builder(TRACE_SPAN_NAME)
            .with_kind(SpanKind::Internal)
            .with_attributes(attributes)
            .start(&self.tracer);
        span.end();
        Ok(())
    }

    fn track_exception(
        &self,
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Result<(), SinkError> {
        let mut attributes: Vec<KeyValue> = property_attributes(properties).collect();
        if let Some(severity) = severity {
            attributes.extend(severity_attributes(severity));
        }

        let mut span = self
            .tracer
            .span_builder(EXCEPTION_SPAN_NAME)
            .with_kind(SpanKind::Internal)
            .with_attributes(attributes)
            .start(&self.tracer);
        span.record_error(error);
        span.set_status(Status::error(error.to_string()));
        span.end();
        Ok(())
    }
}
