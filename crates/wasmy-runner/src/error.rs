//! Runner error types.

use thiserror::Error;
use wasmy_types::{BufferOverflow, CodecError};

/// Errors surfaced by [`Runner`](crate::Runner) and [`GuestModule`](crate::GuestModule).
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// An encoded frame does not fit the negotiated buffer capacity.
    #[error(transparent)]
    BufferOverflow(BufferOverflow),

    /// The module bytes are not a valid WebAssembly module.
    #[error("compile failed: {0}")]
    Compile(String),

    /// The module imports something the host does not provide.
    #[error("unresolved import {module}.{name}")]
    Link { module: String, name: String },

    /// Instantiation or the module's start function failed.
    #[error("instantiation failed: {0}")]
    Instantiation(String),

    /// A required guest boilerplate export is missing or has the wrong type.
    #[error("guest is missing boilerplate export `{0}`")]
    MissingBoilerplate(String),

    /// A requested export is not present in the module.
    #[error("export not found: {0}")]
    ExportNotFound(String),

    /// A requested export is not an `(i32) -> i32` function.
    #[error("export `{0}` is not an (i32) -> i32 function")]
    ExportSignature(String),

    /// `call` named a function that warm-up did not resolve.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("runner is already warmed up")]
    AlreadyWarm,

    #[error("runner has not been warmed up")]
    NotWarmedUp,

    /// The guest reported a failure through an error frame.
    #[error("function `{function}` failed: {message}")]
    Guest { function: String, message: String },

    /// The guest returned a length outside `0..=capacity`.
    #[error("function `{function}` returned output length {len} (capacity {capacity})")]
    InvalidOutputLength {
        function: String,
        len: i32,
        capacity: usize,
    },

    /// The guest trapped.
    #[error("function `{function}` trapped: {message}")]
    Trap { function: String, message: String },

    /// The per-call fuel allowance ran out before the guest returned.
    #[error("function `{function}` ran out of fuel")]
    FuelExhausted { function: String },

    /// Reading or writing guest linear memory failed.
    #[error("guest memory access failed: {0}")]
    Memory(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for RunnerError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Overflow(overflow) => RunnerError::BufferOverflow(overflow),
            other => RunnerError::Codec(other),
        }
    }
}

impl From<BufferOverflow> for RunnerError {
    fn from(overflow: BufferOverflow) -> Self {
        RunnerError::BufferOverflow(overflow)
    }
}

/// Runner result type alias.
pub type RunnerResult<T> = Result<T, RunnerError>;
