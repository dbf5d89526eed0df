//! Fault classification and translation.
//!
//! # Responsibilities
//! - Present one failure contract at the HTTP boundary: a short message
//!   and a generic status code, never internal kind names or backtraces
//! - Log every fault exactly once, with full detail, via the router
//! - Re-signal instead of translating when the response already started
//!
//! # Design Decisions
//! - Faults are a tagged enum dispatched through one classification table,
//!   not a type hierarchy inspected at runtime
//! - `invoke` wraps the entire downstream future, so faults raised before
//!   or after a suspension point take the same path

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::logging::event::{FaultDetail, Level, LogEvent};
use crate::logging::RouterHandle;

const SOURCE: &str = "weathercast.http.fault";

/// A request-handling fault, classified at the raise site.
#[derive(Debug, Clone, Error)]
pub enum Fault {
    /// Internal misuse, not the caller's fault, but surfaced as 400 to
    /// match the classification table.
    #[error("{0}")]
    InvalidOperation(String),

    /// Malformed caller input.
    #[error("{0}")]
    InvalidArgument(String),

    /// Anything else.
    #[error("{0}")]
    Unclassified(String),
}

impl Fault {
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::InvalidOperation(_) => "invalid_operation",
            Fault::InvalidArgument(_) => "invalid_argument",
            Fault::Unclassified(_) => "unclassified",
        }
    }

    /// The single dispatch table: fault category → response status + log
    /// severity.
    pub fn classify(&self) -> (StatusCode, Level) {
        match self {
            Fault::InvalidOperation(_) | Fault::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, Level::Error)
            }
            Fault::Unclassified(_) => (StatusCode::INTERNAL_SERVER_ERROR, Level::Error),
        }
    }

    pub fn detail(&self) -> FaultDetail {
        FaultDetail {
            kind: self.kind().to_string(),
            message: self.to_string(),
            detail: None,
        }
    }

    /// Pull a fault a handler stored in the response extensions.
    pub fn take_from(response: &mut Response) -> Option<Fault> {
        response.extensions_mut().remove::<Fault>()
    }
}

/// Lets handlers bail with `?`. The fault rides the response extensions to
/// the translation middleware; the placeholder status is never sent.
impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Middleware converting unhandled faults into uniform JSON error
/// responses.
#[derive(Clone)]
pub struct FaultTranslator {
    log: RouterHandle,
}

impl FaultTranslator {
    pub fn new(log: RouterHandle) -> Self {
        Self { log }
    }

    /// Invoke the downstream handler and translate its fault, if any.
    ///
    /// Returns `Ok(response)` when a response can be written (success, or a
    /// translated fault) and `Err(fault)` when it cannot: the response
    /// already started, or the client is gone. Re-signaled faults propagate
    /// to the enclosing framework untouched. Every fault path emits exactly
    /// one log event.
    pub async fn invoke<F>(&self, ctx: &RequestContext, downstream: F) -> Result<Response, Fault>
    where
        F: std::future::Future<Output = Result<Response, Fault>>,
    {
        let fault = match downstream.await {
            Ok(response) => return Ok(response),
            Err(fault) => fault,
        };

        let log = ctx.log(&self.log);

        if ctx.cancelled() {
            // No receiver for a response; log once and hand the fault up.
            log.emit(
                LogEvent::new(
                    Level::Warning,
                    SOURCE,
                    "request cancelled by client; no response written",
                )
                .with_fault(fault.detail()),
            );
            return Err(fault);
        }

        if ctx.response_started() {
            log.emit(
                LogEvent::new(
                    Level::Warning,
                    SOURCE,
                    "response already started; cannot rewrite it, re-signaling fault",
                )
                .with_fault(fault.detail()),
            );
            return Err(fault);
        }

        let (status, severity) = fault.classify();
        log.emit(
            LogEvent::new(severity, SOURCE, format!("request failed: {}", fault))
                .with_property("status", status.as_u16())
                .with_fault(fault.detail()),
        );

        let body = serde_json::json!({ "message": fault.to_string() });
        ctx.mark_response_started();
        Ok((status, Json(body)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(
            Fault::InvalidOperation("x".into()).classify(),
            (StatusCode::BAD_REQUEST, Level::Error)
        );
        assert_eq!(
            Fault::InvalidArgument("x".into()).classify(),
            (StatusCode::BAD_REQUEST, Level::Error)
        );
        assert_eq!(
            Fault::Unclassified("x".into()).classify(),
            (StatusCode::INTERNAL_SERVER_ERROR, Level::Error)
        );
    }

    #[test]
    fn detail_carries_kind_and_message() {
        let fault = Fault::InvalidArgument("temperature out of range".into());
        let detail = fault.detail();
        assert_eq!(detail.kind, "invalid_argument");
        assert_eq!(detail.message, "temperature out of range");
    }
}
