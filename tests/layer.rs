//! Access log layer driven through the router without a network listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use combined_log::access_log::{AccessLogLayer, AccessLogger, ByteCount, FixedClock, RemoteAddr};
use combined_log::{AppConfig, HttpServer};
use futures_util::stream;
use tower::{service_fn, Layer, Service, ServiceExt};

mod common;

use common::{base_time, SharedBuffer, TokioClock};

fn request(path: &str) -> Request<Body> {
    let mut request = Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("user:pass")))
        .body(Body::empty())
        .unwrap();
    let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, usize) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.len())
}

fn demo_router(buf: &SharedBuffer) -> Router {
    let logger = AccessLogger::new(buf.sink()).with_clock(Arc::new(TokioClock::new()));
    HttpServer::with_logger(AppConfig::default(), logger).router()
}

#[tokio::test(start_paused = true)]
async fn usage_logs_body_length() {
    let buf = SharedBuffer::default();
    let (status, len) = send(demo_router(&buf), request("/usage")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(len, 78);
    assert_eq!(
        buf.take(),
        "127.0.0.1 - user [10/Nov/2009:23:00:00 +0000] \"GET /usage HTTP/1.1\" 200 78 0.000/0.000 \"-\" \"-\" - -\n"
    );
}

#[tokio::test(start_paused = true)]
async fn denied_logs_status_without_body() {
    let buf = SharedBuffer::default();
    let (status, len) = send(demo_router(&buf), request("/denied")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(len, 0);
    assert_eq!(
        buf.take(),
        "127.0.0.1 - user [10/Nov/2009:23:00:00 +0000] \"GET /denied HTTP/1.1\" 401 0 0.000/0.000 \"-\" \"-\" - -\n"
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_path_falls_back_to_not_found() {
    let buf = SharedBuffer::default();
    let (status, _) = send(demo_router(&buf), request("/usage/subpath")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        buf.take(),
        "127.0.0.1 - user [10/Nov/2009:23:00:00 +0000] \"GET /usage/subpath HTTP/1.1\" 404 0 0.000/0.000 \"-\" \"-\" - -\n"
    );
}

#[tokio::test(start_paused = true)]
async fn delayed_handler_reports_elapsed_time() {
    let buf = SharedBuffer::default();
    let (status, _) = send(demo_router(&buf), request("/delayed")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        buf.take(),
        "127.0.0.1 - user [10/Nov/2009:23:00:00 +0000] \"GET /delayed HTTP/1.1\" 200 0 0.050/0.050 \"-\" \"-\" - -\n"
    );
}

#[tokio::test]
async fn headers_and_remote_addr_override() {
    let buf = SharedBuffer::default();
    let router = Router::new()
        .route("/somepage", get(|| async { "ok" }))
        .layer(AccessLogLayer::new(
            AccessLogger::new(buf.sink()).with_clock(Arc::new(FixedClock(base_time()))),
        ));

    let mut req = Request::builder()
        .uri("/somepage?q=1")
        .header(header::REFERER, "https://github.com/")
        .header(header::USER_AGENT, "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko)")
        .body(Body::empty())
        .unwrap();
    req.extensions_mut().insert(RemoteAddr("10.1.2.254".into()));

    send(router, req).await;
    assert_eq!(
        buf.take(),
        "10.1.2.254 - - [10/Nov/2009:23:00:00 +0000] \"GET /somepage?q=1 HTTP/1.1\" 200 2 0.000/0.000 \"https://github.com/\" \"Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko)\" - -\n"
    );
}

fn chunked_router(buf: &SharedBuffer, byte_count: ByteCount) -> Router {
    let handler = || async {
        let chunks = vec![
            Ok::<_, std::io::Error>("0123456789"),
            Ok("abcdef"),
            Ok("xyz"),
        ];
        Body::from_stream(stream::iter(chunks))
    };
    Router::new().route("/stream", get(handler)).layer(AccessLogLayer::new(
        AccessLogger::new(buf.sink())
            .with_clock(Arc::new(FixedClock(base_time())))
            .with_byte_count(byte_count),
    ))
}

#[tokio::test]
async fn streamed_body_counts_last_chunk_by_default() {
    let buf = SharedBuffer::default();
    let (_, len) = send(chunked_router(&buf, ByteCount::LastWrite), request("/stream")).await;

    assert_eq!(len, 19);
    assert!(buf.take().contains("\"GET /stream HTTP/1.1\" 200 3 "));
}

#[tokio::test]
async fn streamed_body_counts_total_when_configured() {
    let buf = SharedBuffer::default();
    let (_, len) = send(chunked_router(&buf, ByteCount::Total), request("/stream")).await;

    assert_eq!(len, 19);
    assert!(buf.take().contains("\"GET /stream HTTP/1.1\" 200 19 "));
}

#[tokio::test]
async fn dropped_body_still_logs_once() {
    let buf = SharedBuffer::default();
    let response = demo_router(&buf).oneshot(request("/usage")).await.unwrap();
    assert!(buf.contents().is_empty());

    drop(response);
    let contents = buf.take();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("\"GET /usage HTTP/1.1\" 200 0 "));
}

fn failing_service(buf: &SharedBuffer) -> impl Service<Request<Body>, Error = std::io::Error> {
    let inner = service_fn(|_req: Request<Body>| async {
        Err::<Response<Body>, _>(std::io::Error::other("boom"))
    });
    AccessLogLayer::new(AccessLogger::new(buf.sink()).with_clock(Arc::new(FixedClock(base_time())))).layer(inner)
}

#[tokio::test]
async fn inner_error_logs_server_error_and_passes_through() {
    let buf = SharedBuffer::default();
    let mut req = Request::builder().uri("/x").body(Body::empty()).unwrap();
    req.extensions_mut().insert(RemoteAddr("1.2.3.4:5678".into()));

    let err = match failing_service(&buf).oneshot(req).await {
        Ok(_) => panic!("inner error was swallowed"),
        Err(e) => e,
    };
    assert_eq!(err.to_string(), "boom");
    assert_eq!(
        buf.take(),
        "1.2.3.4 - - [10/Nov/2009:23:00:00 +0000] \"GET /x HTTP/1.1\" 500 0 0.000/0.000 \"-\" \"-\" - -\n"
    );
}

#[tokio::test(start_paused = true)]
async fn abandoned_request_logs_client_closed() {
    let buf = SharedBuffer::default();
    let router = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "late"
            }),
        )
        .layer(AccessLogLayer::new(
            AccessLogger::new(buf.sink()).with_clock(Arc::new(FixedClock(base_time()))),
        ));

    let outcome = tokio::time::timeout(Duration::from_millis(20), router.oneshot(request("/slow"))).await;
    assert!(outcome.is_err());
    assert_eq!(
        buf.take(),
        "127.0.0.1 - user [10/Nov/2009:23:00:00 +0000] \"GET /slow HTTP/1.1\" 499 0 0.000/0.000 \"-\" \"-\" - -\n"
    );
}

#[tokio::test]
async fn unpolled_request_future_still_logs() {
    let buf = SharedBuffer::default();
    let mut service = failing_service(&buf);
    let future = service.ready().await.unwrap().call(request("/never"));
    assert!(buf.contents().is_empty());

    drop(future);
    let contents = buf.take();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("\"GET /never HTTP/1.1\" 499 0 "), "{contents}");
}
