use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters of a raw server payload kept for diagnosis.
pub const PREVIEW_LIMIT: usize = 500;

/// Coarse failure class. Decides whether a retry can change the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, DNS failure, timeout.
    NetworkTransient,
    /// The service answered with an error status or an error payload.
    ServerRejected,
    /// The body could not be interpreted as PDF, text, or JSON error.
    DecodeFailure,
    /// A precondition failed before any network call.
    ValidationFailure,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::NetworkTransient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkTransient => "network_transient",
            ErrorKind::ServerRejected => "server_rejected",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::ValidationFailure => "validation_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that has been sorted into the [`ErrorKind`] taxonomy.
///
/// Every variant carries a human-readable `message` and an optional raw
/// detail (server body, truncated preview, underlying I/O error) kept for
/// diagnosis. The `Display` impl prints only the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    #[error("{message}")]
    NetworkTransient {
        message: String,
        detail: Option<String>,
    },

    #[error("{message}")]
    ServerRejected {
        message: String,
        detail: Option<String>,
        /// HTTP status when the rejection came from a status code. `None`
        /// when a success status carried an error payload.
        status: Option<u16>,
    },

    #[error("{message}")]
    DecodeFailure {
        message: String,
        preview: Option<String>,
    },

    #[error("{message}")]
    ValidationFailure {
        message: String,
        detail: Option<String>,
    },
}

impl ClassifiedError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkTransient {
            message: message.into(),
            detail: None,
        }
    }

    pub fn network_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NetworkTransient {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn rejected(
        status: Option<u16>,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::ServerRejected {
            message: message.into(),
            detail,
            status,
        }
    }

    pub fn decode(message: impl Into<String>, preview: Option<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
            preview,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
            detail: None,
        }
    }

    pub fn validation_with_detail(message: impl Into<String>, detail: Option<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
            detail,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkTransient { .. } => ErrorKind::NetworkTransient,
            Self::ServerRejected { .. } => ErrorKind::ServerRejected,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::ValidationFailure { .. } => ErrorKind::ValidationFailure,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NetworkTransient { message, .. }
            | Self::ServerRejected { message, .. }
            | Self::DecodeFailure { message, .. }
            | Self::ValidationFailure { message, .. } => message,
        }
    }

    pub fn raw_detail(&self) -> Option<&str> {
        match self {
            Self::NetworkTransient { detail, .. }
            | Self::ServerRejected { detail, .. }
            | Self::ValidationFailure { detail, .. } => detail.as_deref(),
            Self::DecodeFailure { preview, .. } => preview.as_deref(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    /// True for a `ServerRejected` caused by HTTP 503.
    pub fn is_service_unavailable(&self) -> bool {
        self.status() == Some(503)
    }

    /// Tell the user whether trying again makes sense.
    pub fn user_guidance(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NetworkTransient => {
                "The rendering service could not be reached. This is an infrastructure \
                 problem; retrying later may help."
            }
            ErrorKind::ServerRejected if self.is_service_unavailable() => {
                "The rendering service is temporarily unavailable. Check that it is running, \
                 then retry."
            }
            ErrorKind::ServerRejected => {
                "The service rejected the request. Retrying the same template will not help; \
                 review the template or the server detail."
            }
            ErrorKind::DecodeFailure => {
                "The service response could not be interpreted as a PDF. Retrying will not \
                 help; inspect the response preview."
            }
            ErrorKind::ValidationFailure => {
                "The request is incomplete. Fix the input before trying again."
            }
        }
    }
}

/// Truncate `text` to at most `limit` characters, appending `...` when cut.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
