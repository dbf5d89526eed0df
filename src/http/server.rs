//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request timeout, context + fault translation)
//! - Emit the "request received" event with correlation properties
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - Context creation, the "request received" event, the cancellation
//!   guard, and fault translation live in one middleware wrapping every
//!   route, so /health and unmatched paths take the same path as the
//!   forecast endpoint
//! - Handlers return `Result<_, Fault>`; a fault rides the response
//!   extensions to the middleware, which translates it

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;
use crate::http::context::RequestContext;
use crate::http::fault::{Fault, FaultTranslator};
use crate::http::forecast::{self, DEFAULT_FORECAST_DAYS, MAX_FORECAST_DAYS};
use crate::logging::event::{Level, LogEvent};
use crate::logging::RouterHandle;

const SOURCE: &str = "weathercast.http.server";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub log: RouterHandle,
    pub translator: FaultTranslator,
    /// Shared so a configured seed yields one deterministic stream.
    pub rng: Arc<Mutex<StdRng>>,
}

/// HTTP server for the forecast API.
pub struct HttpServer {
    router: Router,
    log: RouterHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &AppConfig, log: RouterHandle) -> Self {
        let rng = match config.forecast.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let state = AppState {
            log: log.clone(),
            translator: FaultTranslator::new(log.clone()),
            rng: Arc::new(Mutex::new(rng)),
        };

        let router = Self::build_router(config, state);
        Self { router, log }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/weatherforecast", get(forecast_handler))
            .route("/health", get(health_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                observe_request,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        self.log.emit(
            LogEvent::new(Level::Information, SOURCE, "HTTP server starting")
                .with_property("address", addr.to_string()),
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.log
            .emit(LogEvent::new(Level::Information, SOURCE, "HTTP server stopped"));
        Ok(())
    }
}

/// Cross-cutting wrapper around every route: builds the request context,
/// emits "request received", guards against cancellation, and translates
/// faults the downstream handler raised.
async fn observe_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ctx = RequestContext::new(request.method().as_str(), request.uri().path());
    let log = ctx.log(&state.log);
    log.emit(LogEvent::new(Level::Information, SOURCE, "request received"));

    // If the client disconnects, the framework drops this future; the
    // guard's destructor emits the single cancellation Warning.
    let guard = ctx.cancellation_guard(ctx.log(&state.log));

    let outcome = state
        .translator
        .invoke(&ctx, async {
            let mut response = next.run(request).await;
            match Fault::take_from(&mut response) {
                Some(fault) => Err(fault),
                None => Ok(response),
            }
        })
        .await;
    guard.disarm();

    match outcome {
        Ok(response) => response,
        Err(_) => {
            // Unreachable for buffered handlers: the context is never
            // marked started or cancelled before invoke returns. A
            // streaming handler that re-signals here needs connection
            // teardown, not this reply.
            debug_assert!(
                !ctx.response_started(),
                "re-signaled fault after response start"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /weatherforecast`: one record per day, `today+1` onward. `days`
/// defaults to five and is capped at fourteen.
async fn forecast_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Fault> {
    let days = match params.get("days") {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
            .ok_or_else(|| {
                Fault::InvalidArgument(format!(
                    "days must be an integer between 1 and {}",
                    MAX_FORECAST_DAYS
                ))
            })?,
        None => DEFAULT_FORECAST_DAYS,
    };

    let today = Utc::now().date_naive();
    let records = {
        let mut rng = state
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        forecast::generate(&mut rng, today, days)
    };
    Ok(Json(records).into_response())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
