//! Structured log routing subsystem.
//!
//! # Data Flow
//! ```text
//! call site builds LogEvent
//!     → RouterHandle::emit (enrichment, per-sink filtering)
//!     → mpsc channel per sink (non-blocking, unbounded)
//!     → sink worker task (owns the writer, serializes output)
//!     → console (stdout) / debug (stderr) / rolling daily file
//!
//! On shutdown:
//!     flush_and_close sends a barrier down each channel
//!     → worker flushes → acknowledges → handle returns
//! ```
//!
//! # Design Decisions
//! - No global logger: the handle is constructed once at startup and
//!   passed explicitly to every component that emits events
//! - Events are write-once; the router takes them by value
//! - emit never fails observably; sink write errors are contained in the
//!   worker and self-logged once per failure burst
//! - Filtering happens at emit time so a dropped event costs no channel send

pub mod event;
pub mod filter;
pub mod router;
pub mod sink;

pub use event::{FaultDetail, Level, LogEvent};
pub use filter::LevelFilter;
pub use router::{RequestLog, Router, RouterError, RouterHandle};
