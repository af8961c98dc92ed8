//! Guest-side error types.

use thiserror::Error;
use wasmy_types::{ArgError, BufferOverflow, CodecError};

/// Errors raised inside a guest module.
///
/// Any of these escaping a wrapped export is turned into an error frame by
/// [`crate::GuestInstance::dispatch`]; none of them aborts the instance.
#[derive(Debug, Error)]
pub enum GuestError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Overflow(#[from] BufferOverflow),

    #[error(transparent)]
    Arg(#[from] ArgError),

    /// The host function reported an error frame.
    #[error("host function failed: {0}")]
    Host(String),

    /// The guest's own business logic failed.
    #[error("{0}")]
    Failed(String),
}

impl GuestError {
    pub fn failed(message: impl Into<String>) -> Self {
        GuestError::Failed(message.into())
    }
}

/// Guest result type alias.
pub type GuestResult<T> = Result<T, GuestError>;
