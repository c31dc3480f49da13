use thiserror::Error;

/// Marker every legacy sentinel answer starts with.
pub const SENTINEL_PREFIX: &str = "[ERROR]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    ConnectionRefused,
    Connect,
    Status(u16),
    Other,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection_refused",
            Self::Connect => "connect",
            Self::Status(_) => "upstream_status",
            Self::Other => "transport",
        }
    }
}

/// Failure of a single question relay.
///
/// The `Display` output is the sentinel text shown to interactive users and
/// written to the interaction log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AskError {
    #[error("[ERROR] Failed to contact API: {message}")]
    Transport { kind: TransportKind, message: String },
    #[error("[ERROR] Unexpected response format from API")]
    UnexpectedFormat { detail: String },
}

impl AskError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn unexpected_format(detail: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            detail: detail.into(),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Transport { kind, .. } => kind.as_str(),
            Self::UnexpectedFormat { .. } => "unexpected_format",
        }
    }
}

pub type AskResult = Result<String, AskError>;
