//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → TraceLayer → AccessLogLayer → TimeoutLayer
//!     → handlers.rs (usage / denied / delayed / 404)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;

pub use server::HttpServer;
