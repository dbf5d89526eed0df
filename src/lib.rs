//! Weathercast: a minimal forecast API with structured log routing.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 WEATHERCAST                  │
//!                        │                                              │
//!    Client Request      │  ┌─────────┐   ┌────────────┐   ┌─────────┐ │
//!    ────────────────────┼─▶│  http   │──▶│   fault    │──▶│forecast │ │
//!                        │  │ server  │   │ translator │   │ handler │ │
//!                        │  └─────────┘   └─────┬──────┘   └────┬────┘ │
//!                        │                      │               │      │
//!                        │                      ▼               ▼      │
//!                        │               ┌─────────────────────────┐   │
//!                        │               │       log router        │   │
//!                        │               │  filter → sink workers  │   │
//!                        │               └──┬────────┬────────┬───┘   │
//!                        │                  ▼        ▼        ▼       │
//!                        │               console   debug   rolling    │
//!                        │               (stdout) (stderr)   file     │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! Two cross-cutting components wrap the single endpoint:
//!
//! - The **log router** receives severity-leveled, structured events from
//!   any call site and forwards each to the configured sinks that pass its
//!   per-sink minimum-level filter. One worker task per sink serializes
//!   physical writes.
//! - The **fault translator** wraps the downstream handler, classifies
//!   unhandled faults, logs each exactly once, and produces a uniform
//!   `{"message": ...}` JSON error response. If the response has already
//!   started, the fault is re-signaled upward instead.

// Cross-cutting concerns
pub mod config;
pub mod logging;

// HTTP boundary
pub mod http;

pub use config::AppConfig;
pub use http::HttpServer;
pub use logging::{Router, RouterHandle};
