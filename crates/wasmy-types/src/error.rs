//! Error types shared across the codec, guest and host crates.

use thiserror::Error;

/// An encoded frame does not fit the fixed buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("frame of {len} bytes exceeds buffer capacity of {capacity} bytes")]
pub struct BufferOverflow {
    /// Size of the rejected frame.
    pub len: usize,
    /// Capacity of the target buffer.
    pub capacity: usize,
}

/// Errors raised while encoding or decoding a frame.
///
/// Decode errors carry the byte offset (from the start of the frame) at
/// which the problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Zero-length input where a frame was expected.
    #[error("empty frame")]
    EmptyFrame,

    /// The frame ended before a complete value could be read.
    #[error("truncated frame at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    /// First byte is not a known frame kind.
    #[error("unknown frame kind 0x{kind:02x}")]
    UnknownFrameKind { kind: u8 },

    /// A well-formed frame of the wrong kind.
    #[error("expected {expected} frame, found {found} frame")]
    UnexpectedFrame {
        expected: &'static str,
        found: &'static str,
    },

    /// A value tag that no [`crate::Value`] variant uses.
    #[error("unknown value tag 0x{tag:02x} at byte {offset}")]
    UnknownTag { offset: usize, tag: u8 },

    /// A bool value whose payload byte is neither 0 nor 1.
    #[error("invalid bool byte 0x{byte:02x} at byte {offset}")]
    InvalidBool { offset: usize, byte: u8 },

    /// String bytes are not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// A map key that is not a string value.
    #[error("map key at byte {offset} is not a string")]
    NonStringKey { offset: usize },

    /// Nested lists/maps deeper than the decoder allows.
    #[error("nesting deeper than {limit} levels at byte {offset}")]
    DepthExceeded { offset: usize, limit: usize },

    /// A declared length or element count that cannot fit in the remaining bytes.
    #[error("declared length {declared} at byte {offset} exceeds the {remaining} remaining bytes")]
    LengthOverflow {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    /// Bytes left over after a complete frame.
    #[error("{remaining} trailing bytes after frame at byte {offset}")]
    TrailingBytes { offset: usize, remaining: usize },

    /// A value that the wire format cannot represent.
    #[error("unsupported value at {position}: {reason}")]
    Unsupported { position: String, reason: String },

    /// The encoded frame is larger than the target buffer.
    #[error(transparent)]
    Overflow(#[from] BufferOverflow),
}

/// Codec result type alias.
pub type CodecResult<T> = Result<T, CodecError>;
