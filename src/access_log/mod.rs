//! Access logging subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → logger.rs (read start instant, snapshot request fields)
//!     → capture.rs (record status and body bytes while forwarding)
//!     → inner handler / service
//!     → logger.rs (read end instant)
//!     → format.rs (combined log line)
//!     → sink.rs (append line + newline)
//! ```
//!
//! Synchronous handlers go through [`AccessLogger::handle`]; tower services
//! go through [`AccessLogLayer`].
//!
//! # Design Decisions
//! - Stats are per request and never shared, so capture needs no locking
//! - The sink serializes whole lines; it is the only shared writer
//! - The clock is injected at construction, never global

pub mod capture;
pub mod clock;
pub mod format;
pub mod layer;
pub mod logger;
pub mod request;
pub mod sink;
pub mod stats;

pub use capture::{BufferedResponse, CaptureBody, CaptureWriter, ResponseWriter};
pub use clock::{Clock, FixedClock, SyntheticClock, SystemClock};
pub use format::{format_access_log, AccessLogRecord};
pub use layer::{AccessLogLayer, AccessLogService};
pub use logger::{AccessLogger, Handler, Logged, CLIENT_CLOSED_REQUEST};
pub use request::{BasicCredentials, RemoteAddr, RequestInfo, RequestSnapshot};
pub use sink::{LogSink, SinkError};
pub use stats::{ByteCount, ResponseStats};
