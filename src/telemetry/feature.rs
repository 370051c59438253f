//! Feature usage tracking sessions.
//!
//! A [`FeatureUsageSession`] is a scoped guard: creating it emits a
//! `FeatureUsage.Start` event and releasing it emits `FeatureUsage.End`.
//! Release happens either explicitly through [`FeatureUsageSession::end`],
//! which reports sink failures, or implicitly when the session is dropped,
//! so early returns and panics still close the session.
//!
//! ```rust,ignore
//! let session = FeatureUsageSession::start(sink.clone(), "export")?;
//! let step = session.sub_feature("render")?;
//! if let Err(e) = render() {
//!     step.on_exception(&e)?;
//! }
//! step.end()?;
//! session.end()?;
//! ```
//!
//! Sub-features inherit the *parent reference* of the session they are
//! spawned from, not its own reference. Every descendant of a root therefore
//! shares the root's (absent) parent and correlation stays one level deep.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::telemetry::error::{SinkError, TelemetryError};
use crate::telemetry::sink::{Properties, TelemetrySink};

pub const START_EVENT: &str = "FeatureUsage.Start";
pub const END_EVENT: &str = "FeatureUsage.End";

pub const NAME_PROPERTY: &str = "Name";
pub const REFERENCE_PROPERTY: &str = "Reference";
pub const PARENT_REFERENCE_PROPERTY: &str = "ParentReference";

/// Correlation identifier of a feature usage session.
///
/// Always a random (v4) UUID, which can never equal the nil UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference(Uuid);

impl Reference {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing identifier. The nil UUID means "no reference"
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        if uuid.is_nil() {
            None
        } else {
            Some(Self(uuid))
        }
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Reference {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.0)
    }
}

impl std::str::FromStr for Reference {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What [`FeatureUsageSession::on_exception`] does with reported errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionPolicy {
    /// Forward the error to the sink as an exception record
    #[default]
    Forward,
    /// Accept and drop the error
    Discard,
}

impl fmt::Display for ExceptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Discard => f.write_str("discard"),
        }
    }
}

impl std::str::FromStr for ExceptionPolicy {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "on" | "true" => Ok(Self::Forward),
            "discard" | "off" | "false" => Ok(Self::Discard),
            other => Err(TelemetryError::Config(format!("unknown exception policy '{}'", other))),
        }
    }
}

/// One tracked invocation of a named feature
pub struct FeatureUsageSession {
    name: String,
    reference: Reference,
    parent_reference: Option<Reference>,
    exception_policy: ExceptionPolicy,
    sink: Arc<dyn TelemetrySink>,
    ended: bool,
}

impl FeatureUsageSession {
    /// Start a root session
    pub fn start(sink: Arc<dyn TelemetrySink>, name: impl Into<String>) -> Result<Self, SinkError> {
        Self::start_with_parent(sink, name, None)
    }

    /// Start a session correlated to `parent_reference`
    pub fn start_with_parent(
        sink: Arc<dyn TelemetrySink>,
        name: impl Into<String>,
        parent_reference: Option<Reference>,
    ) -> Result<Self, SinkError> {
        Self::start_with_policy(sink, name, parent_reference, ExceptionPolicy::default())
    }

    pub fn start_with_policy(
        sink: Arc<dyn TelemetrySink>,
        name: impl Into<String>,
        parent_reference: Option<Reference>,
        exception_policy: ExceptionPolicy,
    ) -> Result<Self, SinkError> {
        let mut session = Self {
            name: name.into(),
            reference: Reference::new(),
            parent_reference,
            exception_policy,
            sink,
            // Not armed until the start event is delivered.
            ended: true,
        };

        session.sink.track_event(START_EVENT, &session.properties())?;
        session.ended = false;
        debug!(feature = %session.name, reference = %session.reference, "feature usage started");
        Ok(session)
    }

    /// Start a child session sharing this session's parent reference
    pub fn sub_feature(&self, name: impl Into<String>) -> Result<Self, SinkError> {
        Self::start_with_policy(
            Arc::clone(&self.sink),
            name,
            self.parent_reference,
            self.exception_policy,
        )
    }

    /// Report an error that occurred while the feature was running
    pub fn on_exception(&self, error: &dyn std::error::Error) -> Result<(), SinkError> {
        match self.exception_policy {
            ExceptionPolicy::Forward => self.sink.track_exception(error, None, &self.properties()),
            ExceptionPolicy::Discard => Ok(()),
        }
    }

    /// Close the session, reporting a failed end event to the caller
    pub fn end(mut self) -> Result<(), SinkError> {
        self.ended = true;
        self.emit_end()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn parent_reference(&self) -> Option<Reference> {
        self.parent_reference
    }

    pub fn exception_policy(&self) -> ExceptionPolicy {
        self.exception_policy
    }

    /// Correlation properties attached to every record of this session
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert(NAME_PROPERTY.to_string(), self.name.clone());
        properties.insert(REFERENCE_PROPERTY.to_string(), self.reference.to_string());
        if let Some(parent) = self.parent_reference {
            properties.insert(PARENT_REFERENCE_PROPERTY.to_string(), parent.to_string());
        }
        properties
    }

    fn emit_end(&self) -> Result<(), SinkError> {
        self.sink.track_event(END_EVENT, &self.properties())?;
        debug!(feature = %self.name, reference = %self.reference, "feature usage ended");
        Ok(())
    }
}

impl Drop for FeatureUsageSession {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if let Err(e) = self.emit_end() {
            warn!(
                feature = %self.name,
                reference = %self.reference,
                error = %e,
                "failed to deliver feature usage end event"
            );
        }
    }
}

impl fmt::Debug for FeatureUsageSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureUsageSession")
            .field("name", &self.name)
            .field("reference", &self.reference)
            .field("parent_reference", &self.parent_reference)
            .field("exception_policy", &self.exception_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sink::{MemorySink, TelemetryRecord};

    fn sink() -> Arc<MemorySink> {
        Arc::new(MemorySink::new())
    }

    #[derive(Debug, thiserror::Error)]
    #[error("render failed")]
    struct RenderError;

    #[test]
    fn start_emits_one_event_without_parent() {
        let sink = sink();

        let session = FeatureUsageSession::start(sink.clone(), "X").unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let (name, props) = &events[0];
        assert_eq!(name, START_EVENT);
        assert_eq!(props[NAME_PROPERTY], "X");
        assert_eq!(props[REFERENCE_PROPERTY], session.reference().to_string());
        assert!(!props.contains_key(PARENT_REFERENCE_PROPERTY));
        assert!(!session.reference().as_uuid().is_nil());
    }

    #[test]
    fn start_with_parent_sets_parent_property() {
        let sink = sink();
        let parent = Reference::new();

        let _session = FeatureUsageSession::start_with_parent(sink.clone(), "X", Some(parent)).unwrap();

        assert_eq!(sink.events()[0].1[PARENT_REFERENCE_PROPERTY], parent.to_string());
    }

    #[test]
    fn end_emits_matching_reference() {
        let sink = sink();
        let session = FeatureUsageSession::start(sink.clone(), "X").unwrap();
        let reference = session.reference().to_string();

        session.end().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].0, END_EVENT);
        assert_eq!(events[1].1[REFERENCE_PROPERTY], reference);
        assert_eq!(events[0].1, events[1].1);
    }

    #[test]
    fn drop_emits_end_exactly_once() {
        let sink = sink();
        {
            let _session = FeatureUsageSession::start(sink.clone(), "scoped").unwrap();
        }

        let names: Vec<String> = sink.events().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![START_EVENT, END_EVENT]);
    }

    #[test]
    fn end_fires_on_error_path() {
        fn work(sink: Arc<MemorySink>) -> Result<(), RenderError> {
            let _session = FeatureUsageSession::start(sink, "failing").map_err(|_| RenderError)?;
            Err(RenderError)
        }

        let sink = sink();
        assert!(work(sink.clone()).is_err());

        let names: Vec<String> = sink.events().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![START_EVENT, END_EVENT]);
    }

    #[test]
    fn end_fires_on_panic() {
        let sink = sink();
        let inner = sink.clone();

        let result = std::panic::catch_unwind(move || {
            let _session = FeatureUsageSession::start(inner, "panicking").unwrap();
            panic!("feature blew up");
        });

        assert!(result.is_err());
        assert_eq!(sink.events().last().unwrap().0, END_EVENT);
    }

    #[test]
    fn sub_feature_of_root_has_no_parent() {
        let sink = sink();
        let root = FeatureUsageSession::start(sink.clone(), "X").unwrap();

        let child = root.sub_feature("Y").unwrap();

        assert_eq!(child.parent_reference(), None);
        let (_, props) = &sink.events()[1];
        assert_eq!(props[NAME_PROPERTY], "Y");
        assert!(!props.contains_key(PARENT_REFERENCE_PROPERTY));
        assert_ne!(child.reference(), root.reference());
    }

    #[test]
    fn sub_feature_forwards_original_parent_not_own_reference() {
        let sink = sink();
        let r = Reference::new();
        let child = FeatureUsageSession::start_with_parent(sink.clone(), "child", Some(r)).unwrap();

        let grandchild = child.sub_feature("grandchild").unwrap();
        let great = grandchild.sub_feature("great").unwrap();

        assert_eq!(grandchild.parent_reference(), Some(r));
        assert_eq!(great.parent_reference(), Some(r));
        let events = sink.events();
        assert_eq!(events[1].1[PARENT_REFERENCE_PROPERTY], r.to_string());
        assert_ne!(events[1].1[PARENT_REFERENCE_PROPERTY], child.reference().to_string());
    }

    #[test]
    fn child_end_does_not_end_parent() {
        let sink = sink();
        let root = FeatureUsageSession::start(sink.clone(), "root").unwrap();
        let child = root.sub_feature("child").unwrap();

        child.end().unwrap();
        assert_eq!(sink.events().len(), 3);

        root.end().unwrap();
        let events = sink.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[3].1[NAME_PROPERTY], "root");
    }

    #[test]
    fn on_exception_carries_identity() {
        let sink = sink();
        let session = FeatureUsageSession::start(sink.clone(), "X").unwrap();

        session.on_exception(&RenderError).unwrap();

        let exceptions = sink.exceptions();
        assert_eq!(exceptions.len(), 1);
        match &exceptions[0] {
            TelemetryRecord::Exception {
                exception,
                severity,
                properties,
            } => {
                assert_eq!(exception.message, "render failed");
                assert_eq!(*severity, None);
                assert_eq!(properties[NAME_PROPERTY], "X");
                assert_eq!(properties[REFERENCE_PROPERTY], session.reference().to_string());
            }
            other => panic!("expected exception, got {other:?}"),
        }
    }

    #[test]
    fn discard_policy_drops_exceptions() {
        let sink = sink();
        let session = FeatureUsageSession::start_with_policy(
            sink.clone(),
            "X",
            None,
            ExceptionPolicy::Discard,
        )
        .unwrap();
        let child = session.sub_feature("Y").unwrap();

        session.on_exception(&RenderError).unwrap();
        child.on_exception(&RenderError).unwrap();

        assert!(sink.exceptions().is_empty());
        assert_eq!(child.exception_policy(), ExceptionPolicy::Discard);
    }

    #[test]
    fn failed_start_returns_error_and_emits_no_end() {
        let sink = sink();
        sink.set_rejecting(true);

        let result = FeatureUsageSession::start(sink.clone(), "X");
        sink.set_rejecting(false);
        drop(result);

        assert!(sink.is_empty());
    }

    #[test]
    fn explicit_end_reports_sink_failure() {
        let sink = sink();
        let session = FeatureUsageSession::start(sink.clone(), "X").unwrap();
        sink.set_rejecting(true);

        assert!(matches!(session.end(), Err(SinkError::Rejected(_))));
    }

    #[test]
    fn drop_swallows_sink_failure() {
        let sink = sink();
        let session = FeatureUsageSession::start(sink.clone(), "X").unwrap();
        sink.set_rejecting(true);

        drop(session);

        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn nil_uuid_is_not_a_reference() {
        assert!(Reference::from_uuid(Uuid::nil()).is_none());
        assert!(Reference::from_uuid(Uuid::new_v4()).is_some());
    }

    #[test]
    fn reference_display_parses_back() {
        let reference = Reference::new();

        let parsed: Reference = reference.to_string().parse().unwrap();

        assert_eq!(parsed, reference);
    }

    #[test]
    fn exception_policy_parses() {
        assert_eq!("Discard".parse::<ExceptionPolicy>().unwrap(), ExceptionPolicy::Discard);
        assert_eq!("off".parse::<ExceptionPolicy>().unwrap(), ExceptionPolicy::Discard);
        assert_eq!("forward".parse::<ExceptionPolicy>().unwrap(), ExceptionPolicy::Forward);
        assert!("sometimes".parse::<ExceptionPolicy>().is_err());
    }
}
