//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! base file (TOML)
//!     → optional environment overlay file (<name>.<environment>.toml)
//!     → process environment variables (WEATHERCAST__SECTION__FIELD)
//!     → merged toml::Value tree (loader.rs)
//!     → AppConfig (serde deserialize)
//!     → validation.rs (semantic checks)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; it lives for the process lifetime
//! - All fields have defaults so a missing base file still starts the
//!   service with a console sink
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
