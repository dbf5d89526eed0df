//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the merged
//! configuration tree. Every struct has a `Default` so a minimal (or
//! absent) config file still yields a runnable service.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::event::Level;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Log router configuration: sinks, category rules, enrichment.
    pub logging: LoggingConfig,

    /// Forecast endpoint settings.
    pub forecast: ForecastConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Log router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global minimum level when no sink override or category rule applies.
    pub default_level: Level,

    /// Bound on how long flush_and_close waits per sink.
    pub flush_timeout_ms: u64,

    /// Output targets. Each filters the event stream independently.
    pub sinks: Vec<SinkConfig>,

    /// Per-category minimum-level overrides (prefix rules).
    pub category_rules: Vec<CategoryRuleConfig>,

    /// Static properties stamped onto every event.
    pub enrich: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::Information,
            flush_timeout_ms: 5_000,
            sinks: vec![SinkConfig::default()],
            category_rules: Vec::new(),
            enrich: BTreeMap::new(),
        }
    }
}

/// Kind of destination a sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Text lines to stdout.
    #[default]
    Console,

    /// Compact text lines to stderr.
    Debug,

    /// JSON lines to a daily-rolling file.
    File,
}

/// One configured output target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink identifier for self-logging and diagnostics.
    pub name: String,

    /// Destination kind.
    pub kind: SinkKind,

    /// Per-sink minimum level. Overrides category rules and the global
    /// default when set.
    pub min_level: Option<Level>,

    /// Output template for text sinks ({timestamp}, {level}, {source},
    /// {message}). Ignored by the file sink, which always writes JSON.
    pub template: Option<String>,

    /// Directory for file sinks. Required when kind = "file".
    pub directory: Option<PathBuf>,

    /// File name prefix; files are named `<prefix><YYYY-MM-DD>.<ext>`.
    pub prefix: String,

    /// File name extension, without the leading dot.
    pub extension: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            kind: SinkKind::Console,
            min_level: None,
            template: None,
            directory: None,
            prefix: "weathercast-".to_string(),
            extension: "log".to_string(),
        }
    }
}

/// Minimum-level override for one source-category subtree.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRuleConfig {
    /// Category prefix (dot-bounded; a trailing ".*" is accepted).
    pub prefix: String,

    /// Minimum level for the subtree.
    pub level: Level,
}

/// Forecast endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForecastConfig {
    /// Fixed RNG seed for deterministic output. Entropy-seeded when unset.
    pub seed: Option<u64>,
}
