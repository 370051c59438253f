use std::sync::Arc;

use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::telemetry::config::TelemetryConfig;
use crate::telemetry::error::{SinkError, TelemetryError};
use crate::telemetry::factory::LoggerFactory;
use crate::telemetry::feature::FeatureUsageSession;
use crate::telemetry::log::LogFacade;
use crate::telemetry::sink::{OtelSink, TelemetrySink};
use crate::telemetry::trace::init_subscriber;

/// Trait for tracer providers backing the [`OtelSink`]
pub trait TelemetryProvider: Send + Sync {
    /// Build the tracer provider for this backend
    fn build_tracer_provider(
        &self,
        config: &TelemetryConfig,
    ) -> impl std::future::Future<Output = Result<SdkTracerProvider, TelemetryError>> + Send;
}

/// Running telemetry pipeline: tracer provider, sink, and the factory bound to it
pub struct Telemetry {
    provider: SdkTracerProvider,
    factory: LoggerFactory,
}

impl Telemetry {
    /// Wire an [`OtelSink`] on top of `provider` without touching global state
    pub fn new(provider: SdkTracerProvider, config: &TelemetryConfig) -> Self {
        let tracer = provider.tracer(config.service_name.clone());
        let sink: Arc<dyn TelemetrySink> = Arc::new(OtelSink::new(tracer));
        Self {
            provider,
            factory: LoggerFactory::from_config(sink, config),
        }
    }

    pub fn factory(&self) -> &LoggerFactory {
        &self.factory
    }

    pub fn sink(&self) -> Arc<dyn TelemetrySink> {
        self.factory.sink()
    }

    pub fn logger(&self, source: impl Into<String>) -> LogFacade {
        self.factory.logger(source)
    }

    pub fn feature(&self, name: impl Into<String>) -> Result<FeatureUsageSession, SinkError> {
        self.factory.feature(name)
    }

    pub fn tracer_provider(&self) -> &SdkTracerProvider {
        &self.provider
    }

    /// Flush pending spans and stop the provider
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        self.provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))
    }
}

/// Initialize telemetry with a specific provider and install the diagnostic subscriber
pub async fn init_with_provider<P: TelemetryProvider>(
    provider: &P,
    config: &TelemetryConfig,
) -> Result<Telemetry, TelemetryError> {
    let tracer_provider = provider.build_tracer_provider(config).await?;
    init_subscriber(&tracer_provider, config)?;
    config.report_invalid_env();
    Ok(Telemetry::new(tracer_provider, config))
}

/// Initialize telemetry with config using the default OTLP provider
pub async fn init_with_config(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    let provider = crate::telemetry::default::DefaultProvider;
    init_with_provider(&provider, config).await
}

/// Initialize telemetry from environment
pub async fn init() -> Result<Telemetry, TelemetryError> {
    let config = TelemetryConfig::from_env();
    init_with_config(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::default::DefaultProvider;
    use crate::telemetry::feature::ExceptionPolicy;
    use crate::telemetry::severity::LogLevel;

    #[tokio::test]
    async fn telemetry_wires_factory_from_config() {
        let config = TelemetryConfig::new("test", "1.0")
            .with_minimum_level(LogLevel::Warn)
            .with_exception_policy(ExceptionPolicy::Discard);
        let provider = DefaultProvider.build_tracer_provider(&config).await.unwrap();

        let telemetry = Telemetry::new(provider, &config);

        assert_eq!(telemetry.logger("svc").minimum_level(), LogLevel::Warn);
        let session = telemetry.feature("startup").unwrap();
        assert_eq!(session.exception_policy(), ExceptionPolicy::Discard);
        session.end().unwrap();
        telemetry.logger("svc").warn("ready in {0} ms", (12,)).unwrap();
        telemetry.shutdown().unwrap();
    }
}
