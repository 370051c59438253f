use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::telemetry::config::{LogFormat, TelemetryConfig};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::severity::{LogLevel, SeverityLevel};

/// Build the OpenTelemetry tracing layer
pub fn build_otel_layer<S>(
    provider: &SdkTracerProvider,
    service_name: &str,
) -> OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let tracer = provider.tracer(service_name.to_string());
    tracing_opentelemetry::layer().with_tracer(tracer)
}

/// JSON formatter with `severity` at root level, named like the backend severities
struct SeverityJsonFormat;

impl<S, N> FormatEvent<S, N> for SeverityJsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let severity = SeverityLevel::from(LogLevel::from(*event.metadata().level()));

        let mut record = serde_json::Map::new();
        record.insert("severity".into(), severity.as_str().into());
        record.insert(
            "timestamp".into(),
            chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
                .into(),
        );
        record.insert("target".into(), event.metadata().target().into());

        if let Some(span) = ctx.lookup_current() {
            record.insert("span".into(), span.name().into());
        }

        event.record(&mut JsonVisitor(&mut record));

        let line = serde_json::to_string(&record).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

/// Visitor to collect event fields into a JSON map
struct JsonVisitor<'a>(&'a mut serde_json::Map<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::Value::String(format!("{:?}", value)),
        );
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0
            .insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0
            .insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0
            .insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0
            .insert(field.name().to_string(), serde_json::Value::Bool(value));
    }
}

/// Build the JSON fmt layer for structured logging
pub fn build_json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .event_format(SeverityJsonFormat)
        .with_ansi(false)
}

/// Build the pretty fmt layer for human-readable output (local dev)
pub fn build_pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// Build the env filter from config
pub fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global tracing subscriber with all layers
///
/// Fails if a global subscriber is already installed.
pub fn init_subscriber(
    provider: &SdkTracerProvider,
    config: &TelemetryConfig,
) -> Result<(), TelemetryError> {
    // The global tracer provider must be set before layers are created
    opentelemetry::global::set_tracer_provider(provider.clone());

    let otel_layer = build_otel_layer(provider, &config.service_name);
    let filter = build_filter(config);

    let result = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer)
            .with(build_pretty_layer())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer)
            .with(build_json_layer())
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}
