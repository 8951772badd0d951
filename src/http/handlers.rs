//! Demo endpoints served behind the access logger.

use std::time::Duration;

use axum::http::StatusCode;

/// Body of `/usage`; 78 bytes.
pub const USAGE_MESSAGE: &str = "
supported requests:
\t/render/?target=
\t/metrics/find/?query=
\t/info/?target=
";

/// Delay applied by `/delayed`.
pub const DELAY: Duration = Duration::from_millis(50);

pub async fn usage() -> &'static str {
    USAGE_MESSAGE
}

pub async fn denied() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

pub async fn delayed() {
    tokio::time::sleep(DELAY).await;
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_message_length() {
        assert_eq!(USAGE_MESSAGE.len(), 78);
    }
}
