//! Tower middleware that writes an access log line for every response.
//!
//! The line is written when the response body has been fully streamed (or
//! dropped), so the bytes field reflects what the handler actually produced.
//! A request whose future is dropped before a response exists is logged
//! with status 499 and no bytes.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::{Request, Response, StatusCode};
use tower::{Layer, Service};

use crate::access_log::capture::CaptureBody;
use crate::access_log::logger::{AccessLogger, PendingEntry};
use crate::access_log::request::RequestSnapshot;
use crate::access_log::stats::ResponseStats;

/// Applies [`AccessLogService`] to the wrapped service.
#[derive(Debug, Clone)]
pub struct AccessLogLayer {
    logger: AccessLogger,
}

impl AccessLogLayer {
    pub fn new(logger: AccessLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Service produced by [`AccessLogLayer`].
#[derive(Debug, Clone)]
pub struct AccessLogService<S> {
    inner: S,
    logger: AccessLogger,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<CaptureBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let logger = self.logger.clone();
        let pending = PendingEntry::new(logger.clone(), RequestSnapshot::capture(&request), logger.now());

        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match inner.call(request).await {
                Ok(response) => {
                    let mut stats = ResponseStats::new();
                    stats.record_status(response.status());
                    let (parts, body) = response.into_parts();
                    let body = CaptureBody::new(body, stats, logger.byte_count(), pending);
                    Ok(Response::from_parts(parts, body))
                }
                Err(e) => {
                    let mut stats = ResponseStats::new();
                    stats.record_status(StatusCode::INTERNAL_SERVER_ERROR);
                    pending.finish(stats);
                    Err(e)
                }
            }
        })
    }
}
