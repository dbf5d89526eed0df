//! Log event and severity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered severity scale for log events.
///
/// Ordering is significant: a sink with minimum level `M` accepts an event
/// at level `L` iff `L >= M`. `Critical` doubles as the fatal severity for
/// startup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Fixed label for text output templates.
    pub fn label(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Information => "INFO",
            Level::Warning => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "information" | "info" => Ok(Level::Information),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Fault details attached to events raised on failure paths.
///
/// The full detail lives only in the sinks; callers of the HTTP boundary
/// never see `kind` or `detail`.
#[derive(Debug, Clone, Serialize)]
pub struct FaultDetail {
    /// Classification name (e.g. "invalid_argument").
    pub kind: String,

    /// The fault's own message.
    pub message: String,

    /// Extended diagnostic detail, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A single structured log event.
///
/// Events are ephemeral: created at the call site, routed, and discarded.
/// They are write-once from the producer's perspective: the router takes
/// ownership and never mutates `level` or hands the event back out.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// Wall-clock time of emission.
    pub timestamp: DateTime<Utc>,

    /// Severity, immutable after construction.
    pub level: Level,

    /// Emitting component, dot-separated (e.g. "weathercast.http.forecast").
    pub source: String,

    /// Rendered human-readable message.
    pub message: String,

    /// Structured key/value properties, kept queryable by the file sink.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Associated fault, present only on Warning/Error/Critical fault paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultDetail>,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            source: source.into(),
            message: message.into(),
            properties: Map::new(),
            fault: None,
        }
    }

    /// Attach a structured property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach fault details.
    pub fn with_fault(mut self, fault: FaultDetail) -> Self {
        self.fault = Some(fault);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Information);
        assert!(Level::Information < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn level_parses_aliases() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Information);
        assert_eq!("Warning".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("fatal".parse::<Level>().unwrap(), Level::Critical);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn event_serializes_properties() {
        let event = LogEvent::new(Level::Information, "weathercast.test", "hello")
            .with_property("request_id", "abc");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "information");
        assert_eq!(json["properties"]["request_id"], "abc");
        assert!(json.get("fault").is_none());
    }
}
