//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → axum router (timeout layer)
//!     → RequestContext created, "request received" event emitted
//!     → FaultTranslator wraps the handler future
//!     → handler (forecast generation)
//!     → success: response untouched
//!       fault:   classified, logged once, translated to {"message": ...}
//!                or re-signaled if the response already started
//! ```

pub mod context;
pub mod fault;
pub mod forecast;
pub mod server;

pub use context::{CancellationGuard, RequestContext};
pub use fault::{Fault, FaultTranslator};
pub use server::HttpServer;
