//! The access logger and its request wrapper.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::access_log::capture::{CaptureWriter, ResponseWriter};
use crate::access_log::clock::{Clock, SystemClock};
use crate::access_log::format::{format_access_log, AccessLogRecord};
use crate::access_log::request::{RequestInfo, RequestSnapshot};
use crate::access_log::sink::{LogSink, SinkError};
use crate::access_log::stats::{ByteCount, ResponseStats};
use crate::config::AccessLogConfig;

/// A synchronous request handler.
///
/// Implemented for every `Fn(&mut dyn ResponseWriter, &R)`.
pub trait Handler<R: ?Sized>: Send + Sync {
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &R);
}

impl<R: ?Sized, F> Handler<R> for F
where
    F: Fn(&mut dyn ResponseWriter, &R) + Send + Sync,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &R) {
        self(writer, request)
    }
}

/// Writes one combined-log line per request.
///
/// Cheap to clone; clones share the sink and the clock.
#[derive(Clone)]
pub struct AccessLogger {
    sink: LogSink,
    clock: Arc<dyn Clock>,
    byte_count: ByteCount,
}

impl AccessLogger {
    /// Log to `sink` using the wall clock.
    pub fn new(sink: LogSink) -> Self {
        Self {
            sink,
            clock: Arc::new(SystemClock),
            byte_count: ByteCount::default(),
        }
    }

    /// Build from optional parts; absent parts fall back to standard error
    /// and the wall clock.
    pub fn with_parts(sink: Option<LogSink>, clock: Option<Arc<dyn Clock>>) -> Self {
        let mut logger = Self::new(sink.unwrap_or_default());
        if let Some(clock) = clock {
            logger.clock = clock;
        }
        logger
    }

    /// Build from the `[access_log]` config section, opening its output.
    pub fn from_config(config: &AccessLogConfig) -> Result<Self, SinkError> {
        let sink = LogSink::from_destination(&config.output)?;
        Ok(Self::new(sink).with_byte_count(config.byte_count))
    }

    /// Replace the clock used for both timestamp and elapsed time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Choose how multiple body writes are counted.
    pub fn with_byte_count(mut self, byte_count: ByteCount) -> Self {
        self.byte_count = byte_count;
        self
    }

    /// The configured byte-count mode.
    pub fn byte_count(&self) -> ByteCount {
        self.byte_count
    }

    pub(crate) fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Wrap `handler` so every call through it is logged.
    pub fn handle<H>(&self, handler: H) -> Logged<H> {
        Logged {
            logger: self.clone(),
            handler,
        }
    }

    /// Run `handler` for one request and log the outcome.
    ///
    /// Returns only after the handler has finished and the line is written.
    pub fn serve<R, H>(&self, handler: &H, writer: &mut dyn ResponseWriter, request: &R)
    where
        R: RequestInfo + ?Sized,
        H: Handler<R> + ?Sized,
    {
        let start = self.now();
        let mut stats = ResponseStats::new();
        {
            let mut capture = CaptureWriter::new(writer, &mut stats, self.byte_count);
            handler.serve(&mut capture, request);
        }
        PendingEntry::new(self.clone(), RequestSnapshot::capture(request), start).finish(stats);
    }

    pub(crate) fn log(&self, record: &AccessLogRecord<'_>) {
        let line = format_access_log(record);
        if let Err(e) = self.sink.write_line(&line) {
            tracing::warn!(error = %e, "Failed to write access log line");
        }
    }
}

impl Default for AccessLogger {
    fn default() -> Self {
        Self::new(LogSink::default())
    }
}

impl std::fmt::Debug for AccessLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLogger")
            .field("sink", &self.sink)
            .field("byte_count", &self.byte_count)
            .finish_non_exhaustive()
    }
}

/// A handler wrapped by [`AccessLogger::handle`].
pub struct Logged<H> {
    logger: AccessLogger,
    handler: H,
}

impl<R, H> Handler<R> for Logged<H>
where
    R: RequestInfo + ?Sized,
    H: Handler<R>,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, request: &R) {
        self.logger.serve(&self.handler, writer, request);
    }
}

/// Status logged when a request is abandoned before a response exists,
/// e.g. the client disconnected and the server dropped the request future.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

struct EntryStart {
    logger: AccessLogger,
    request: RequestSnapshot,
    start: DateTime<FixedOffset>,
}

/// A request that has started but not yet been logged.
///
/// Dropping it unfinished still writes a line, with status
/// [`CLIENT_CLOSED_REQUEST`] and no body bytes.
pub(crate) struct PendingEntry {
    entry: Option<EntryStart>,
}

impl PendingEntry {
    pub(crate) fn new(logger: AccessLogger, request: RequestSnapshot, start: DateTime<FixedOffset>) -> Self {
        Self {
            entry: Some(EntryStart {
                logger,
                request,
                start,
            }),
        }
    }

    /// Stop the timer and write the line.
    pub(crate) fn finish(mut self, stats: ResponseStats) {
        self.write(stats);
    }

    fn write(&mut self, stats: ResponseStats) {
        let Some(entry) = self.entry.take() else {
            return;
        };
        let elapsed = (entry.logger.now() - entry.start)
            .to_std()
            .unwrap_or_default();
        let record = AccessLogRecord {
            request: &entry.request,
            timestamp: entry.start,
            stats,
            request_time: elapsed,
            upstream_time: elapsed,
            compression_ratio: 0.0,
        };
        entry.logger.log(&record);
    }
}

impl Drop for PendingEntry {
    fn drop(&mut self) {
        self.write(ResponseStats {
            body_bytes: 0,
            status_code: CLIENT_CLOSED_REQUEST,
        });
    }
}
