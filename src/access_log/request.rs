//! Request introspection for access logging.
//!
//! The logger only needs a handful of facts about a request. [`RequestInfo`]
//! names them so handlers can be driven by any request type, and
//! [`RequestSnapshot`] copies them out before the request is handed to the
//! inner service.

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{AUTHORIZATION, REFERER, USER_AGENT};

/// Peer address as reported by the transport, e.g. `"10.1.2.254:4567"`.
///
/// Takes precedence over axum's `ConnectInfo<SocketAddr>` when both are
/// present in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

/// Credentials carried in an `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Read access to the request fields that end up in a log line.
pub trait RequestInfo {
    fn remote_addr(&self) -> Option<Cow<'_, str>>;
    fn request_method(&self) -> &str;
    fn request_url(&self) -> Cow<'_, str>;
    fn protocol(&self) -> Cow<'_, str>;
    /// Header lookup by name, case-insensitive.
    fn header_value(&self, name: &str) -> Option<&str>;

    fn basic_auth(&self) -> Option<BasicCredentials> {
        self.header_value(AUTHORIZATION.as_str())
            .and_then(parse_basic_auth)
    }
}

impl<B> RequestInfo for http::Request<B> {
    fn remote_addr(&self) -> Option<Cow<'_, str>> {
        if let Some(RemoteAddr(addr)) = self.extensions().get::<RemoteAddr>() {
            return Some(Cow::Borrowed(addr.as_str()));
        }
        self.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| Cow::Owned(addr.to_string()))
    }

    fn request_method(&self) -> &str {
        self.method().as_str()
    }

    fn request_url(&self) -> Cow<'_, str> {
        Cow::Owned(self.uri().to_string())
    }

    fn protocol(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{:?}", self.version()))
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

/// Decode a `Basic` authorization header into its credentials.
///
/// Returns `None` for other schemes, invalid base64, non-UTF-8 payloads
/// and payloads without a `:` separator.
pub fn parse_basic_auth(header: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Client IP portion of a transport address.
///
/// `[addr]:port` yields `addr`; anything else is cut at the first `:`, so
/// `"127.0.0.1:1234"` gives `"127.0.0.1"` and a bare IP is returned as is.
pub fn client_ip(remote_addr: &str) -> &str {
    if let Some(rest) = remote_addr.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host;
        }
    }
    remote_addr.split(':').next().unwrap_or(remote_addr)
}

/// The request fields of an access log line, copied out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub remote_addr: Option<String>,
    pub username: Option<String>,
    pub method: String,
    pub url: String,
    pub proto: String,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestSnapshot {
    pub fn capture<R: RequestInfo + ?Sized>(request: &R) -> Self {
        Self {
            remote_addr: request.remote_addr().map(Cow::into_owned),
            username: request
                .basic_auth()
                .map(|c| c.username)
                .filter(|u| !u.is_empty()),
            method: request.request_method().to_string(),
            url: request.request_url().into_owned(),
            proto: request.protocol().into_owned(),
            referer: request.header_value(REFERER.as_str()).map(str::to_string),
            user_agent: request
                .header_value(USER_AGENT.as_str())
                .map(str::to_string),
        }
    }
}
