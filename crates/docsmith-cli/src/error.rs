use docsmith_core::ClassifiedError;
use docsmith_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ControllerError {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            ControllerError::Classified(e) => Some(e),
            ControllerError::Session(e) => e.classified(),
        }
    }
}
