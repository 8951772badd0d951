//! Combined-format HTTP access logging.

pub mod access_log;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use access_log::{AccessLogLayer, AccessLogger};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
