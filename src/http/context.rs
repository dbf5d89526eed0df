//! Per-request context.
//!
//! One context object per inbound request, threaded explicitly through the
//! call chain (no thread-locals: request handling may hop worker threads
//! across await points, the context travels with the task). Carries the
//! correlation identifier for log enrichment and the two flags the fault
//! translator branches on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::logging::event::{Level, LogEvent};
use crate::logging::{RequestLog, RouterHandle};

const SOURCE: &str = "weathercast.http.request";

/// Ambient state for one logical request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation identifier attached to every event this request emits.
    pub request_id: Uuid,

    pub method: String,
    pub path: String,

    /// Set once the first response bytes are handed to the transport.
    response_started: Arc<AtomicBool>,

    /// Set when the client disconnects while the request is in flight.
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method: method.into(),
            path: path.into(),
            response_started: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mark_response_started(&self) {
        self.response_started.store(true, Ordering::Release);
    }

    pub fn response_started(&self) -> bool {
        self.response_started.load(Ordering::Acquire)
    }

    pub fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Correlation properties stamped onto every event in this scope.
    pub fn properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("request_id".to_string(), Value::String(self.request_id.to_string()));
        props.insert("method".to_string(), Value::String(self.method.clone()));
        props.insert("path".to_string(), Value::String(self.path.clone()));
        props
    }

    /// Scope the router handle to this request.
    pub fn log(&self, router: &RouterHandle) -> RequestLog {
        router.scoped(self.properties())
    }

    /// Guard the extent of this request's handling. The framework cancels
    /// a request whose client disconnected by dropping its future, so the
    /// guard's destructor is the one place that observes it.
    pub fn cancellation_guard(&self, log: RequestLog) -> CancellationGuard {
        CancellationGuard {
            ctx: self.clone(),
            log: Some(log),
        }
    }
}

/// Emits the cancellation Warning, exactly once, if the request future is
/// dropped before `disarm` is called.
pub struct CancellationGuard {
    ctx: RequestContext,
    log: Option<RequestLog>,
}

impl CancellationGuard {
    /// The request ran to completion; the destructor stays silent.
    pub fn disarm(mut self) {
        self.log = None;
    }
}

impl Drop for CancellationGuard {
    fn drop(&mut self) {
        if let Some(log) = self.log.take() {
            self.ctx.mark_cancelled();
            log.emit(LogEvent::new(
                Level::Warning,
                SOURCE,
                "request cancelled before completion; no response written",
            ));
        }
    }
}
