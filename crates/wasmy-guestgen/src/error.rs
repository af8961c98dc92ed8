//! Guest generation error types.

use thiserror::Error;
use wasmy_types::CodecError;

/// Errors that can occur while emitting a guest module.
#[derive(Debug, Error)]
pub enum GuestGenError {
    /// Two exports would share a name.
    #[error("duplicate export: {0}")]
    DuplicateExport(String),

    /// A precomputed frame does not fit the module's buffer capacity.
    #[error("function `{function}`: frame of {len} bytes exceeds buffer capacity of {capacity}")]
    FrameTooLarge {
        function: String,
        len: usize,
        capacity: usize,
    },

    /// A constant payload could not be encoded.
    #[error("function `{function}`: {source}")]
    Codec {
        function: String,
        #[source]
        source: CodecError,
    },

    /// The module layout does not fit a 32-bit address space.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The generated WASM module failed validation.
    #[error("WASM validation failed: {0}")]
    ValidationFailed(String),
}

/// Guest generation result type alias.
pub type GuestGenResult<T> = Result<T, GuestGenError>;
