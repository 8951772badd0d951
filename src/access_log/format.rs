//! Access log line formatting.
//!
//! Produces one line in an extended Apache combined log format:
//!
//! ```text
//! <client-ip> - <user> [<timestamp>] "<method> <url> <proto>" <status> <bytes> <reqSecs>/<upstreamSecs> "<referer>" "<user-agent>" <ratio> -
//! ```
//!
//! Every field has a fallback, so formatting cannot fail.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::access_log::request::{client_ip, RequestSnapshot};
use crate::access_log::stats::ResponseStats;

/// Common log format timestamp, rendered in the timestamp's own offset.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

const ABSENT: &str = "-";

/// Everything that goes into one access log line.
#[derive(Debug, Clone)]
pub struct AccessLogRecord<'a> {
    pub request: &'a RequestSnapshot,
    pub timestamp: DateTime<FixedOffset>,
    pub stats: ResponseStats,
    pub request_time: Duration,
    pub upstream_time: Duration,
    pub compression_ratio: f64,
}

/// Render a record as a single line, without the trailing newline.
pub fn format_access_log(record: &AccessLogRecord<'_>) -> String {
    let request = record.request;
    let mut line = String::with_capacity(256);

    // Writing into a String cannot fail.
    let _ = write!(
        line,
        "{} - {} [{}] \"{} {} {}\" {} {} {}/{} \"{}\" \"{}\" {} -",
        request.remote_addr.as_deref().map(client_ip).unwrap_or(ABSENT),
        request.username.as_deref().unwrap_or(ABSENT),
        record.timestamp.format(TIMESTAMP_FORMAT),
        request.method,
        request.url,
        request.proto,
        record.stats.status_code,
        record.stats.body_bytes,
        format_seconds(record.request_time),
        format_seconds(record.upstream_time),
        request.referer.as_deref().unwrap_or(ABSENT),
        request.user_agent.as_deref().unwrap_or(ABSENT),
        format_ratio(record.compression_ratio),
    );
    line
}

/// Seconds with millisecond precision, e.g. `0.050`.
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Two decimals when positive, `-` otherwise.
pub fn format_ratio(ratio: f64) -> String {
    if ratio > 0.0 {
        format!("{:.2}", ratio)
    } else {
        ABSENT.to_string()
    }
}
