use std::env;

use tracing::warn;

use crate::telemetry::feature::ExceptionPolicy;
use crate::telemetry::severity::LogLevel;

/// Log output format for the crate's own diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors (for local dev)
    #[default]
    Pretty,
    /// JSON structured format (for collectors)
    Json,
}

/// Main telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub otlp_endpoint: Option<String>,
    /// Diagnostic filter directive (`RUST_LOG` syntax)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Minimum level applied to every facade handed out by the factory
    pub minimum_level: LogLevel,
    pub exception_policy: ExceptionPolicy,
    /// Environment values rejected by [`TelemetryConfig::from_env`]
    pub invalid_env: Vec<InvalidEnvValue>,
}

/// An environment variable whose value could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEnvValue {
    pub variable: String,
    pub value: String,
    pub error: String,
}

impl TelemetryConfig {
    /// Create config from environment variables
    /// - Unparseable `TELEMETRY_MIN_LEVEL` / `FEATURE_USAGE_EXCEPTIONS` fall back to defaults
    ///   and are kept in `invalid_env` until a subscriber can report them
    pub fn from_env() -> Self {
        let mut invalid_env = Vec::new();
        let minimum_level = parse_env("TELEMETRY_MIN_LEVEL", &mut invalid_env);
        let exception_policy = parse_env("FEATURE_USAGE_EXCEPTIONS", &mut invalid_env);

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        };

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string()),
            service_version: env::var("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format,
            minimum_level,
            exception_policy,
            invalid_env,
        }
    }

    /// Create a new config with explicit values
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            minimum_level: LogLevel::default(),
            exception_policy: ExceptionPolicy::default(),
            invalid_env: Vec::new(),
        }
    }

    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_minimum_level(mut self, level: LogLevel) -> Self {
        self.minimum_level = level;
        self
    }

    pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.exception_policy = policy;
        self
    }

    /// Warn about every rejected environment value
    pub fn report_invalid_env(&self) {
        for invalid in &self.invalid_env {
            warn!(
                variable = %invalid.variable,
                value = %invalid.value,
                error = %invalid.error,
                "ignoring invalid value, using default"
            );
        }
    }
}

fn parse_env<T>(key: &str, invalid: &mut Vec<InvalidEnvValue>) -> T
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e: T::Err| {
            invalid.push(InvalidEnvValue {
                variable: key.to_string(),
                error: e.to_string(),
                value: raw.clone(),
            });
            T::default()
        }),
        Err(_) => T::default(),
    }
}

#[derive(Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    otlp_endpoint: Option<String>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    minimum_level: Option<LogLevel>,
    exception_policy: Option<ExceptionPolicy>,
}

impl TelemetryConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn json(self) -> Self {
        self.log_format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.log_format(LogFormat::Pretty)
    }

    pub fn minimum_level(mut self, level: LogLevel) -> Self {
        self.minimum_level = Some(level);
        self
    }

    pub fn exception_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.exception_policy = Some(policy);
        self
    }

    pub fn build(self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self
                .service_name
                .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            service_version: self
                .service_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            otlp_endpoint: self.otlp_endpoint,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            log_format: self.log_format.unwrap_or_default(),
            minimum_level: self.minimum_level.unwrap_or_default(),
            exception_policy: self.exception_policy.unwrap_or_default(),
            invalid_env: Vec::new(),
        }
    }
}
