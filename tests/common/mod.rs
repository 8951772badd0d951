//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use combined_log::access_log::{AccessLogger, Clock, LogSink};
use combined_log::{AppConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Base instant used by the deterministic clocks.
pub fn base_time() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2009, 11, 10, 23, 0, 0)
        .unwrap()
}

/// In-memory log destination that can be inspected while shared.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn sink(&self) -> LogSink {
        LogSink::from_writer(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn take(&self) -> String {
        String::from_utf8(std::mem::take(&mut *self.0.lock().unwrap())).unwrap()
    }

    /// Wait until at least `n` complete lines have been written.
    pub async fn wait_for_lines(&self, n: usize) -> String {
        for _ in 0..200 {
            let contents = self.contents();
            if contents.lines().count() >= n && contents.ends_with('\n') {
                return contents;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} log lines, got {:?}", n, self.contents());
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Clock driven by tokio's (pausable) time, starting at [`base_time`].
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Must be created inside a runtime so paused time applies.
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap();
        base_time() + elapsed
    }
}

/// Start the demo server on an ephemeral loopback port.
pub async fn start_server(logger: AccessLogger) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_logger(config, logger);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
