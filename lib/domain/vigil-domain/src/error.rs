use thiserror::Error;

/// Failures surfaced to API clients. Anything unexpected collapses into
/// `Internal`; its message is logged, never returned.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl VigilError {
    pub fn validation(message: impl Into<String>) -> Self {
        VigilError::Validation(message.into())
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, VigilError::Internal(_))
    }
}

pub type VigilResult<T> = Result<T, VigilError>;
