//! Event routing from producers to sink workers.
//!
//! # Responsibilities
//! - Build sink workers from configuration, probing destinations at startup
//! - Fan each emitted event out to every sink whose filter it passes
//! - Stamp static enrichment properties onto every event
//! - Flush and close all sinks exactly once at shutdown
//!
//! # Design Decisions
//! - An unwritable sink destination is fatal at configure time: operators
//!   must not lose visibility silently
//! - emit is infallible from the producer's perspective
//! - The handle is cheap to clone (one Arc); single-instance-per-process
//!   semantics come from constructing it once at the composition root

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::config::schema::{LoggingConfig, SinkKind};
use crate::logging::event::{Level, LogEvent};
use crate::logging::filter::{CategoryRule, LevelFilter};
use crate::logging::sink::{run_sink, SinkMessage, SinkTarget};

/// Errors raised while configuring the router. All are fatal: startup must
/// abort rather than run with degraded visibility.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("sink '{name}' destination is not writable: {source}")]
    UnwritableSink {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sink '{name}' is invalid: {reason}")]
    InvalidSink { name: String, reason: String },
}

struct SinkChannel {
    name: String,
    min_override: Option<Level>,
    tx: mpsc::UnboundedSender<SinkMessage>,
}

struct RouterInner {
    sinks: Vec<SinkChannel>,
    filter: LevelFilter,
    enrich: Map<String, Value>,
    flush_timeout: Duration,
    closed: AtomicBool,
}

/// Constructor namespace for the routing layer.
pub struct Router;

impl Router {
    /// Build the router from configuration and spawn one worker per sink.
    ///
    /// File destinations are probed (directory created, today's file opened
    /// for append) before any worker starts, so a misconfigured sink fails
    /// here instead of dropping events later.
    pub async fn configure(config: &LoggingConfig) -> Result<RouterHandle, RouterError> {
        let filter = LevelFilter::new(
            config.default_level,
            config
                .category_rules
                .iter()
                .map(|rule| CategoryRule {
                    prefix: rule.prefix.clone(),
                    level: rule.level,
                })
                .collect(),
        );

        let mut enrich = Map::new();
        for (key, value) in &config.enrich {
            enrich.insert(key.clone(), Value::String(value.clone()));
        }

        let mut sinks = Vec::with_capacity(config.sinks.len());
        for sink in &config.sinks {
            let target = match sink.kind {
                SinkKind::Console => SinkTarget::console(),
                SinkKind::Debug => SinkTarget::debug(),
                SinkKind::File => {
                    let directory =
                        sink.directory
                            .as_deref()
                            .ok_or_else(|| RouterError::InvalidSink {
                                name: sink.name.clone(),
                                reason: "file sink requires a directory".to_string(),
                            })?;
                    SinkTarget::file(directory, &sink.prefix, &sink.extension)
                        .await
                        .map_err(|source| RouterError::UnwritableSink {
                            name: sink.name.clone(),
                            source,
                        })?
                }
            };

            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_sink(sink.name.clone(), target, sink.template.clone(), rx));
            sinks.push(SinkChannel {
                name: sink.name.clone(),
                min_override: sink.min_level,
                tx,
            });
        }

        Ok(RouterHandle {
            inner: Arc::new(RouterInner {
                sinks,
                filter,
                enrich,
                flush_timeout: Duration::from_millis(config.flush_timeout_ms),
                closed: AtomicBool::new(false),
            }),
        })
    }
}

/// Handle to the running router. Clone freely; all clones share the sinks.
#[derive(Clone)]
pub struct RouterHandle {
    inner: Arc<RouterInner>,
}

impl RouterHandle {
    /// Route one event to every sink whose effective minimum it meets.
    ///
    /// Never fails observably: filtering and channel sends cannot block,
    /// and a closed channel is ignored. Sink write failures stay inside the
    /// worker.
    pub fn emit(&self, mut event: LogEvent) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        for (key, value) in &self.inner.enrich {
            event.properties.entry(key.clone()).or_insert_with(|| value.clone());
        }
        let event = Arc::new(event);
        for sink in &self.inner.sinks {
            let minimum = sink
                .min_override
                .unwrap_or_else(|| self.inner.filter.category_minimum(&event.source));
            if event.level >= minimum {
                let _ = sink.tx.send(SinkMessage::Event(event.clone()));
            }
        }
    }

    /// Scope the handle to one logical operation. Every event emitted
    /// through the returned log gains `properties` unless the event already
    /// carries the key. The context travels with the task, so it survives
    /// suspension points.
    pub fn scoped(&self, properties: Map<String, Value>) -> RequestLog {
        RequestLog {
            handle: self.clone(),
            properties,
        }
    }

    /// Flush every sink and stop accepting events.
    ///
    /// Events emitted before this call are on their sinks, in emission
    /// order per sink, when it returns. A sink that misses the bounded
    /// timeout has its remaining events deliberately dropped. Calling a
    /// second time is a no-op.
    pub async fn flush_and_close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut pending = Vec::with_capacity(self.inner.sinks.len());
        for sink in &self.inner.sinks {
            let (ack_tx, ack_rx) = oneshot::channel();
            if sink.tx.send(SinkMessage::Flush(ack_tx)).is_ok() {
                pending.push((sink.name.clone(), ack_rx));
            }
        }
        for (name, ack) in pending {
            if tokio::time::timeout(self.inner.flush_timeout, ack).await.is_err() {
                eprintln!(
                    "weathercast: sink '{}' did not flush within {:?}, remaining events dropped",
                    name, self.inner.flush_timeout
                );
            }
        }
    }
}

/// A router handle scoped to one request's correlation properties.
pub struct RequestLog {
    handle: RouterHandle,
    properties: Map<String, Value>,
}

impl RequestLog {
    /// Emit with the scope's properties attached.
    pub fn emit(&self, mut event: LogEvent) {
        for (key, value) in &self.properties {
            event.properties.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self.handle.emit(event);
    }
}
