//! Per-request response statistics.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// How body writes are folded into [`ResponseStats::body_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteCount {
    /// Keep only the length of the most recent write.
    #[default]
    LastWrite,
    /// Sum the lengths of every write.
    Total,
}

/// What the capture decorators observed about a response.
///
/// Created fresh for every request and read once after the handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStats {
    pub body_bytes: u64,
    pub status_code: u16,
}

impl ResponseStats {
    /// Zero bytes and `200 OK`, the state before the handler writes anything.
    pub fn new() -> Self {
        Self {
            body_bytes: 0,
            status_code: StatusCode::OK.as_u16(),
        }
    }

    /// Record a body write of `len` bytes.
    pub fn record_write(&mut self, len: usize, mode: ByteCount) {
        let len = len as u64;
        match mode {
            ByteCount::LastWrite => self.body_bytes = len,
            ByteCount::Total => self.body_bytes = self.body_bytes.saturating_add(len),
        }
    }

    /// Record an explicit status; the latest call wins.
    pub fn record_status(&mut self, status: StatusCode) {
        self.status_code = status.as_u16();
    }
}

impl Default for ResponseStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ok_and_empty() {
        let stats = ResponseStats::new();
        assert_eq!(stats.status_code, 200);
        assert_eq!(stats.body_bytes, 0);
    }

    #[test]
    fn last_write_keeps_only_latest_chunk() {
        let mut stats = ResponseStats::new();
        stats.record_write(40, ByteCount::LastWrite);
        stats.record_write(38, ByteCount::LastWrite);
        assert_eq!(stats.body_bytes, 38);
    }

    #[test]
    fn total_sums_chunks() {
        let mut stats = ResponseStats::new();
        stats.record_write(40, ByteCount::Total);
        stats.record_write(38, ByteCount::Total);
        assert_eq!(stats.body_bytes, 78);
    }

    #[test]
    fn status_overwrites() {
        let mut stats = ResponseStats::new();
        stats.record_status(StatusCode::NOT_FOUND);
        stats.record_status(StatusCode::UNAUTHORIZED);
        assert_eq!(stats.status_code, 401);
    }
}
