use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::telemetry::api::TelemetryProvider;
use crate::telemetry::config::TelemetryConfig;
use crate::telemetry::error::TelemetryError;
use crate::telemetry::resource::build_base_resource;

/// Default provider
/// - Batches spans to the configured OTLP collector
/// - Without an endpoint, spans are created but never exported
pub struct DefaultProvider;

impl TelemetryProvider for DefaultProvider {
    async fn build_tracer_provider(
        &self,
        config: &TelemetryConfig,
    ) -> Result<SdkTracerProvider, TelemetryError> {
        let resource = build_base_resource(config);

        let provider = match &config.otlp_endpoint {
            Some(endpoint) => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(endpoint)
                    .build()?;

                SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(resource)
                    .build()
            }
            None => SdkTracerProvider::builder().with_resource(resource).build(),
        };

        Ok(provider)
    }
}
