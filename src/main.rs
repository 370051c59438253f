use std::sync::Arc;

use feature_telemetry::telemetry::{self, Arg, JsonLinesSink, LoggerFactory, TelemetryConfig};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
#[error("report template '{0}' not found")]
struct MissingTemplate(String);

fn render(template: &str) -> Result<String, MissingTemplate> {
    match template {
        "monthly" => Ok("monthly report".to_string()),
        other => Err(MissingTemplate(other.to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TelemetryConfig::from_env();
    let telemetry = telemetry::init_with_config(&config).await?;

    // Without a collector, print records to stdout instead of dropping spans
    let factory = if config.otlp_endpoint.is_some() {
        telemetry.factory().clone()
    } else {
        LoggerFactory::from_config(Arc::new(JsonLinesSink::stdout()), &config)
    };
    let log = factory.logger("demo");

    info!("Telemetry initialized");

    let session = factory.feature("export-reports")?;
    for template in ["monthly", "quarterly"] {
        let step = session.sub_feature(format!("render-{}", template))?;
        match render(template) {
            Ok(report) => log.info("rendered {0} ({1} bytes)", (template, report.len()))?,
            Err(e) => {
                step.on_exception(&e)?;
                log.error_exception(&e, "could not render {0}", (template,))?;
            }
        }
        step.end()?;
    }
    log.debug("export {0} finished", vec![Arg::display(session.reference())])?;
    session.end()?;

    if let Err(e) = telemetry.shutdown() {
        error!(error = %e, "telemetry shutdown failed");
    }
    Ok(())
}
