//! Wire constants: frame kinds and value tags.
//!
//! # Value layouts
//!
//! | Tag      | Body                                                    |
//! |----------|---------------------------------------------------------|
//! | NIL      | (none)                                                  |
//! | BOOL     | u8 (0 = false, 1 = true)                                |
//! | INT      | i64                                                     |
//! | FLOAT    | f64 bits                                                |
//! | STRING   | u32 byte-length, UTF-8 bytes                            |
//! | BYTES    | u32 byte-length, raw bytes                              |
//! | LIST     | u32 element-count, values                               |
//! | MAP      | u32 entry-count, (STRING key value, value) pairs        |

// ── Frame kinds ──────────────────────────────────────────────────────────────

pub const FRAME_ARGS: u8 = 0x01;
pub const FRAME_PAYLOAD: u8 = 0x02;
pub const FRAME_ERROR: u8 = 0x03;

/// Text prefix of an untagged error report; accepted when decoding.
pub const LEGACY_ERROR_PREFIX: &[u8] = b"ERR ";

// ── Value tags ───────────────────────────────────────────────────────────────

pub const TAG_NIL: u8 = 0x00;
pub const TAG_BOOL: u8 = 0x01;
pub const TAG_INT: u8 = 0x02;
pub const TAG_FLOAT: u8 = 0x03;
pub const TAG_STRING: u8 = 0x04;
pub const TAG_BYTES: u8 = 0x05;
pub const TAG_LIST: u8 = 0x06;
pub const TAG_MAP: u8 = 0x07;

// ── Layout ───────────────────────────────────────────────────────────────────

/// Size of a u32 length or count prefix.
pub const LEN_SIZE: usize = 4;

/// Byte offset of the first value in an Args frame (kind byte + count).
pub const ARGS_HEADER_SIZE: usize = 1 + LEN_SIZE;

/// Maximum list/map nesting, enforced by both encoder and decoder.
pub const MAX_DEPTH: usize = 64;
