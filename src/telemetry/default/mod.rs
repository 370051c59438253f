//! Default OTLP tracer provider.
//!
//! # Behavior
//!
//! - If `OTEL_EXPORTER_OTLP_ENDPOINT` is set: spans produced by
//!   [`OtelSink`](crate::telemetry::sink::OtelSink) are batched to that endpoint
//! - Otherwise: spans are not exported

mod provider;

pub use provider::DefaultProvider;
