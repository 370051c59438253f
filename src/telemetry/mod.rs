//! Leveled logging and feature usage tracking over a pluggable telemetry sink.
//!
//! Application code talks to two facades:
//!
//! - [`LogFacade`]: one logger per source label, five severities, positional
//!   message templates, optional culture, optional attached error
//! - [`FeatureUsageSession`]: a scoped guard emitting start/end events with
//!   correlation references, spawning sub-features
//!
//! Both forward to a [`TelemetrySink`]. The default pipeline records
//! everything as OpenTelemetry spans exported over OTLP.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! let telemetry = feature_telemetry::telemetry::init().await?;
//!
//! let log = telemetry.logger("billing");
//! log.info("invoice {0} issued for {1:N2}", ("INV-7", 1234.5))?;
//!
//! let session = telemetry.feature("export")?;
//! let step = session.sub_feature("render")?;
//! step.end()?;
//! session.end()?;
//!
//! telemetry.shutdown()?;
//! ```
//!
//! # Severity mapping
//!
//! | Log level | Backend severity |
//! |-----------|------------------|
//! | Debug     | Verbose          |
//! | Info      | Information      |
//! | Warn      | Warning          |
//! | Error     | Error            |
//! | Fatal     | Critical         |
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_SERVICE_NAME` | Service name | `CARGO_PKG_NAME` |
//! | `OTEL_SERVICE_VERSION` | Service version | `CARGO_PKG_VERSION` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP endpoint | - |
//! | `RUST_LOG` | Diagnostic log filter | `info` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |
//! | `TELEMETRY_MIN_LEVEL` | Facade minimum level | `debug` |
//! | `FEATURE_USAGE_EXCEPTIONS` | `forward` or `discard` | `forward` |
//!
//! # Module Structure
//!
//! - [`severity`]: log levels and the backend severity table
//! - [`format`]: positional message templates and cultures
//! - [`sink`]: the backend boundary and its implementations
//! - [`log`]: the leveled log facade
//! - [`feature`]: feature usage sessions
//! - [`factory`]: explicit wiring of facades and sessions
//! - [`api`], [`config`], [`default`], [`resource`], [`trace`]: process bootstrap

pub mod api;
pub mod config;
pub mod default;
pub mod error;
pub mod factory;
pub mod feature;
pub mod format;
pub mod log;
pub mod resource;
pub mod severity;
pub mod sink;
pub mod trace;

// Re-exports
pub use api::{init, init_with_config, init_with_provider, Telemetry, TelemetryProvider};
pub use config::{InvalidEnvValue, LogFormat, TelemetryConfig, TelemetryConfigBuilder};
pub use error::{FormatError, LogError, SinkError, TelemetryError};
pub use factory::{LogFacadeFactory, LoggerFactory};
pub use feature::{ExceptionPolicy, FeatureUsageSession, Reference};
pub use format::{format_message, Arg, Culture, FormatArgs};
pub use log::LogFacade;
pub use severity::{LogLevel, SeverityLevel};
pub use sink::{JsonLinesSink, MemorySink, OtelSink, Properties, TelemetryRecord, TelemetrySink};
