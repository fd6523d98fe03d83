use thiserror::Error;

/// Failure surfaced by the request executor.
///
/// Only `RequestFailed` reflects the backend's answer; the other variants
/// come from the transport or from a body that did not match its declared
/// content type. Callers in the panel turn every variant into a trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{message}")]
    RequestFailed { status: u16, message: String },
    #[error("network error: {message}")]
    Transport { message: String },
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// HTTP status carried by the failure, `None` when no response arrived.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("api base path must start with '/'")]
    InvalidBasePath,
}
