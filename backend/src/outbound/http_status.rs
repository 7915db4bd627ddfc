//! Shared classification of HTTP failures for the reqwest adapters.
//!
//! Each adapter maps [`FailureKind`] onto its own port error so retry
//! decisions stay consistent across providers.

use reqwest::StatusCode;

/// Coarse failure class of an outbound HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    /// Connection, TLS, or server-side failure.
    Transport,
    /// The call or the upstream timed out.
    Timeout,
    /// The provider asked us to slow down.
    RateLimited,
    /// The provider rejected the request itself.
    Rejected,
}

/// Classify a reqwest error raised before a response arrived.
pub(crate) fn classify_transport(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    }
}

/// Classify a non-success status.
pub(crate) fn classify_status(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Timeout,
        _ if status.is_client_error() => FailureKind::Rejected,
        _ => FailureKind::Transport,
    }
}

/// `status N` or `status N: <preview>` for error messages.
pub(crate) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    }
}

/// Whitespace-collapsed body truncated to 160 characters.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, FailureKind::RateLimited)]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, FailureKind::Timeout)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, FailureKind::Timeout)]
    #[case::bad_request(StatusCode::BAD_REQUEST, FailureKind::Rejected)]
    #[case::forbidden(StatusCode::FORBIDDEN, FailureKind::Rejected)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, FailureKind::Transport)]
    fn statuses_classify(#[case] status: StatusCode, #[case] expected: FailureKind) {
        assert_eq!(classify_status(status), expected);
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x ".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[rstest]
    fn empty_body_gives_bare_status() {
        assert_eq!(status_message(StatusCode::BAD_GATEWAY, b"  "), "status 502");
    }
}
