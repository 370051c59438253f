use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::telemetry::error::SinkError;
use crate::telemetry::severity::SeverityLevel;
use crate::telemetry::sink::{Properties, TelemetryRecord, TelemetrySink};

/// Sink that keeps every delivered record in memory, in delivery order.
///
/// Call [`MemorySink::set_rejecting`] to make subsequent deliveries fail with
/// [`SinkError::Rejected`].
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<TelemetryRecord>>,
    rejecting: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Delivered events as `(name, properties)` pairs
    pub fn events(&self) -> Vec<(String, Properties)> {
        self.lock()
            .iter()
            .filter_map(|record| match record {
                TelemetryRecord::Event { name, properties } => Some((name.clone(), properties.clone())),
                _ => None,
            })
            .collect()
    }

    /// Records that are exceptions
    pub fn exceptions(&self) -> Vec<TelemetryRecord> {
        self.lock()
            .iter()
            .filter(|record| matches!(record, TelemetryRecord::Exception { .. }))
            .cloned()
            .collect()
    }

    // Test inspection must keep working after a panicking writer.
    fn lock(&self) -> MutexGuard<'_, Vec<TelemetryRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, record: TelemetryRecord) -> Result<(), SinkError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected("memory sink is rejecting deliveries".to_string()));
        }
        self.records.lock().map_err(|_| SinkError::Poisoned)?.push(record);
        Ok(())
    }
}

impl TelemetrySink for MemorySink {
    fn track_event(&self, name: &str, properties: &Properties) -> Result<(), SinkError> {
        self.push(TelemetryRecord::event(name, properties))
    }

    fn track_trace(&self, message: &str, severity: SeverityLevel) -> Result<(), SinkError> {
        self.push(TelemetryRecord::trace(message, severity))
    }

    fn track_exception(
        &self,
        error: &dyn std::error::Error,
        severity: Option<SeverityLevel>,
        properties: &Properties,
    ) -> Result<(), SinkError> {
        self.push(TelemetryRecord::exception(error, severity, properties))
    }
}
