//! Response capture decorators.
//!
//! Both decorators forward everything to the response they wrap and only
//! take notes on the side:
//!
//! - [`CaptureWriter`] wraps a synchronous [`ResponseWriter`].
//! - [`CaptureBody`] wraps a streaming `http_body::Body` for tower services.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body::{Body, Frame, SizeHint};

use crate::access_log::logger::PendingEntry;
use crate::access_log::stats::{ByteCount, ResponseStats};

/// The response side of a synchronous handler.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Write body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Set the response status.
    fn write_status(&mut self, status: StatusCode);
}

/// Records body writes and status changes into a [`ResponseStats`] while
/// passing them through to the wrapped writer.
pub struct CaptureWriter<'a, W: ?Sized> {
    inner: &'a mut W,
    stats: &'a mut ResponseStats,
    mode: ByteCount,
}

impl<'a, W: ResponseWriter + ?Sized> CaptureWriter<'a, W> {
    pub fn new(inner: &'a mut W, stats: &'a mut ResponseStats, mode: ByteCount) -> Self {
        Self { inner, stats, mode }
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for CaptureWriter<'_, W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stats.record_write(buf.len(), self.mode);
        self.inner.write(buf)
    }

    fn write_status(&mut self, status: StatusCode) {
        self.stats.record_status(status);
        self.inner.write_status(status);
    }
}

/// An in-memory [`ResponseWriter`].
///
/// Like a real connection, the first status written wins and a body write
/// without a prior status commits `200 OK`.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        } else {
            tracing::debug!(status = %status, "Ignoring superfluous status write");
        }
    }
}

/// Response body wrapper that counts data frames and writes the access log
/// line once the body is finished or dropped.
pub struct CaptureBody<B> {
    inner: B,
    stats: ResponseStats,
    mode: ByteCount,
    pending: Option<PendingEntry>,
}

impl<B> CaptureBody<B> {
    pub(crate) fn new(inner: B, stats: ResponseStats, mode: ByteCount, pending: PendingEntry) -> Self {
        Self {
            inner,
            stats,
            mode,
            pending: Some(pending),
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.finish(self.stats);
        }
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.stats.record_write(data.remaining(), this.mode);
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
            }
            Poll::Ready(None) => this.finish(),
            Poll::Ready(Some(Err(_))) | Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}
