use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::{AskError, TransportKind};

fn error_chain_has(
    err: &(dyn StdError + 'static),
    io_kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == io_kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has(err, ErrorKind::TimedOut, "timed out")
}

/// Classifies a failed `send()` (or body read) into a transport error.
pub(crate) fn completion_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> AskError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return AskError::transport(
            TransportKind::Timeout,
            format!(
                "request to '{}' timed out after {}s (REQUEST_TIMEOUT_SECS)",
                api_url, timeout_secs
            ),
        );
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return AskError::transport(
                TransportKind::ConnectionRefused,
                format!(
                    "connection refused by '{}'; check EURI_API_URL",
                    api_url
                ),
            );
        }

        return AskError::transport(
            TransportKind::Connect,
            format!(
                "failed to connect to '{}'; check EURI_API_URL and network connectivity",
                api_url
            ),
        );
    }

    AskError::transport(TransportKind::Other, format!("{} ({})", err, api_url))
}

pub(crate) fn completion_status_error(
    status: reqwest::StatusCode,
    api_url: &str,
    body: &str,
) -> AskError {
    let snippet: String = body.chars().take(200).collect();
    AskError::transport(
        TransportKind::Status(status.as_u16()),
        format!("{} for url: {} {}", status, api_url, snippet)
            .trim_end()
            .to_string(),
    )
}
