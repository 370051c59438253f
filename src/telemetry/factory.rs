//! Explicit wiring of facades and sessions to a sink.
//!
//! Instead of resolving the backend from ambient global state, callers build
//! a [`LoggerFactory`] once and pass it (or clones of it) to the components
//! that need a logger or a feature session.

use std::sync::Arc;

use crate::telemetry::config::TelemetryConfig;
use crate::telemetry::error::SinkError;
use crate::telemetry::feature::{ExceptionPolicy, FeatureUsageSession, Reference};
use crate::telemetry::log::LogFacade;
use crate::telemetry::severity::LogLevel;
use crate::telemetry::sink::TelemetrySink;

/// Anything that can produce a [`LogFacade`] for a source label
pub trait LogFacadeFactory: Send + Sync {
    fn create(&self, source: &str) -> LogFacade;
}

impl<F> LogFacadeFactory for F
where
    F: Fn(&str) -> LogFacade + Send + Sync,
{
    fn create(&self, source: &str) -> LogFacade {
        self(source)
    }
}

/// Hands out loggers and feature sessions bound to one sink
#[derive(Clone)]
pub struct LoggerFactory {
    sink: Arc<dyn TelemetrySink>,
    minimum_level: LogLevel,
    exception_policy: ExceptionPolicy,
}

impl LoggerFactory {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            minimum_level: LogLevel::default(),
            exception_policy: ExceptionPolicy::default(),
        }
    }

    pub fn from_config(sink: Arc<dyn TelemetrySink>, config: &TelemetryConfig) -> Self {
        Self::new(sink)
            .with_minimum_level(config.minimum_level)
            .with_exception_policy(config.exception_policy)
    }

    pub fn with_minimum_level(mut self, level: LogLevel) -> Self {
        self.minimum_level = level;
        self
    }

    pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.exception_policy = policy;
        self
    }

    pub fn sink(&self) -> Arc<dyn TelemetrySink> {
        Arc::clone(&self.sink)
    }

    /// Logger for an arbitrary source label
    pub fn logger(&self, source: impl Into<String>) -> LogFacade {
        LogFacade::with_minimum_level(source, Arc::clone(&self.sink), self.minimum_level)
    }

    /// Logger labelled with the type name of `T`
    pub fn logger_for<T: ?Sized>(&self) -> LogFacade {
        self.logger(std::any::type_name::<T>())
    }

    /// Start a root feature usage session
    pub fn feature(&self, name: impl Into<String>) -> Result<FeatureUsageSession, SinkError> {
        self.feature_with_parent(name, None)
    }

    pub fn feature_with_parent(
        &self,
        name: impl Into<String>,
        parent_reference: Option<Reference>,
    ) -> Result<FeatureUsageSession, SinkError> {
        FeatureUsageSession::start_with_policy(
            Arc::clone(&self.sink),
            name,
            parent_reference,
            self.exception_policy,
        )
    }
}

impl LogFacadeFactory for LoggerFactory {
    fn create(&self, source: &str) -> LogFacade {
        self.logger(source)
    }
}

impl std::fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("minimum_level", &self.minimum_level)
            .field("exception_policy", &self.exception_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sink::MemorySink;

    struct InvoiceService;

    #[test]
    fn logger_carries_source_and_level() {
        let factory = LoggerFactory::new(Arc::new(MemorySink::new())).with_minimum_level(LogLevel::Error);

        let logger = factory.logger("billing");

        assert_eq!(logger.source(), "billing");
        assert_eq!(logger.minimum_level(), LogLevel::Error);
    }

    #[test]
    fn logger_for_uses_type_name() {
        let factory = LoggerFactory::new(Arc::new(MemorySink::new()));

        let logger = factory.logger_for::<InvoiceService>();

        assert!(logger.source().ends_with("InvoiceService"));
    }

    #[test]
    fn loggers_are_independent() {
        let factory = LoggerFactory::new(Arc::new(MemorySink::new()));
        let a = factory.logger("a");
        let b = factory.logger("b");

        a.set_minimum_level(LogLevel::Fatal);

        assert_eq!(b.minimum_level(), LogLevel::Debug);
    }

    #[test]
    fn from_config_applies_policy_to_sessions() {
        let sink = Arc::new(MemorySink::new());
        let config = TelemetryConfig::new("svc", "1.0").with_exception_policy(ExceptionPolicy::Discard);
        let factory = LoggerFactory::from_config(sink.clone(), &config);

        let session = factory.feature("export").unwrap();

        assert_eq!(session.exception_policy(), ExceptionPolicy::Discard);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn closures_act_as_factories() {
        let sink: Arc<dyn TelemetrySink> = Arc::new(MemorySink::new());
        let factory = move |source: &str| LogFacade::new(source, Arc::clone(&sink));

        let logger = LogFacadeFactory::create(&factory, "closure");

        assert_eq!(logger.source(), "closure");
    }

    #[test]
    fn factory_usable_as_trait_object() {
        let factory: Box<dyn LogFacadeFactory> = Box::new(LoggerFactory::new(Arc::new(MemorySink::new())));

        assert_eq!(factory.create("boxed").source(), "boxed");
    }
}
