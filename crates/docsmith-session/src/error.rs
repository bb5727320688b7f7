use docsmith_core::ClassifiedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A transition was refused (always a `ValidationFailure`).
    #[error(transparent)]
    Rejected(#[from] ClassifiedError),

    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session file version {found} is newer than this build supports ({supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl SessionError {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            SessionError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}
