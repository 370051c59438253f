use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

use crate::telemetry::error::SinkError;
use crate::telemetry::severity::SeverityLevel;
use crate::telemetry::sink::{Properties, TelemetryRecord, TelemetrySink};

#[derive(Serialize)]
struct Line<'a> {
    timestamp: String,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
}

/// Writes each record as a single JSON line, flushing after every record.
///
/// Write failures surface as [`SinkError::Io`].
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::Poisoned)
    }

    fn write(&self, record: &TelemetryRecord) -> Result<(), SinkError> {
        let line = Line {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            record,
        };
        let mut buf = serde_json::to_vec(&line)?;
        buf.push(b'\n');

        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TelemetrySink for JsonLinesSink<W> {
    fn track_event(&self, name: &str, properties: &Properties) -> Result<(), SinkError> {
        self.write(&TelemetryRecord::event(name, properties))
    }

    fn track_trace(&self, message: &str, severity: SeverityLevel) -> Result<(), SinkError> {
        self.write(&TelemetryRecord::trace(message, severity))
    }

    fn track_exception(
        &self,
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Result<(), SinkError> {
        self.write(&TelemetryRecord::exception(error, severity, properties))
    }
}
