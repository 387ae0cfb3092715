use thiserror::Error;

use crate::fanout::FanoutError;
use crate::jobs::PollError;
use crate::transport::RequestError;
use crate::validation::ValidationError;

/// Failure of a client operation.
///
/// Partial job failures and malformed content are not errors: they are
/// reported inside the returned values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Fanout(#[from] FanoutError),
}

impl Error {
    /// Short machine-readable code, used in CLI output
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Request(RequestError::Http { status: 404, .. }) => "NOT_FOUND",
            Error::Request(RequestError::Timeout) => "TIMEOUT",
            Error::Request(_) => "TRANSPORT_ERROR",
            Error::Poll(PollError::Cancelled) => "CANCELLED",
            Error::Poll(_) => "POLL_ERROR",
            Error::Fanout(_) => "FANOUT_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
