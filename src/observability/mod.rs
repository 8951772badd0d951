//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!
//! Consumers:
//!     → stderr via tracing-subscriber fmt layer
//! ```
//!
//! Access log lines are not part of this subsystem; see `access_log`.

pub mod logging;
