//! Status classification shared by the HTTP adapters.

use reqwest::StatusCode;

/// Port-agnostic bucket for a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusClass {
    RateLimited,
    Timeout,
    InvalidRequest,
    Transport,
}

impl StatusClass {
    pub(crate) fn of(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            _ if status.is_client_error() => Self::InvalidRequest,
            _ => Self::Transport,
        }
    }
}

/// `status N` followed by a compact preview of the body, when there is one.
pub(crate) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let body_preview = body_preview(body);
    if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    }
}

fn body_preview(body: &[u8]) -> String {
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
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, StatusClass::RateLimited)]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, StatusClass::Timeout)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, StatusClass::Timeout)]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, StatusClass::InvalidRequest)]
    #[case::conflict(StatusCode::CONFLICT, StatusClass::InvalidRequest)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, StatusClass::Transport)]
    #[case::bad_gateway(StatusCode::BAD_GATEWAY, StatusClass::Transport)]
    fn classifies_statuses(#[case] status: StatusCode, #[case] expected: StatusClass) {
        assert_eq!(StatusClass::of(status), expected);
    }

    #[rstest]
    fn message_compacts_whitespace() {
        let message = status_message(StatusCode::BAD_REQUEST, b"{\n  \"error\":  \"bad\"\n}");

        assert_eq!(message, "status 400: { \"error\": \"bad\" }");
    }

    #[rstest]
    fn message_omits_empty_body() {
        assert_eq!(status_message(StatusCode::NOT_FOUND, b""), "status 404");
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);

        let message = status_message(StatusCode::BAD_GATEWAY, body.as_bytes());

        assert_eq!(message.len(), "status 502: ".len() + 160 + "...".len());
        assert!(message.ends_with("..."));
    }
}
