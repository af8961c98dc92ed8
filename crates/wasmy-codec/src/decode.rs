//! Frame decoding.
//!
//! The decoder works on a borrowed slice with an explicit cursor. Every read
//! is bounds-checked, declared element counts are validated against the
//! bytes that remain before anything is allocated, and nesting is capped at
//! [`MAX_DEPTH`], so malformed input can only ever produce a [`CodecError`].

use std::collections::BTreeMap;

use wasmy_types::{Args, CodecError, CodecResult, Meta, Payload, Value};

use crate::frame::{Frame, FrameKind};
use crate::tags::*;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Decode any frame.
pub fn decode_frame(bytes: &[u8]) -> CodecResult<Frame> {
    let (&kind, _) = bytes.split_first().ok_or(CodecError::EmptyFrame)?;
    if bytes.starts_with(LEGACY_ERROR_PREFIX) {
        let mut dec = Decoder::new(bytes, LEGACY_ERROR_PREFIX.len());
        return Ok(Frame::Error(dec.message()?));
    }

    let kind = FrameKind::from_byte(kind).ok_or(CodecError::UnknownFrameKind { kind })?;
    let mut dec = Decoder::new(bytes, 1);
    let frame = match kind {
        FrameKind::Args => Frame::Args(dec.args()?),
        FrameKind::Payload => Frame::Payload(dec.payload()?),
        FrameKind::Error => Frame::Error(dec.message()?),
    };
    dec.finish()?;
    Ok(frame)
}

/// Decode a frame that must be an Args frame.
pub fn decode_args(bytes: &[u8]) -> CodecResult<Args> {
    match decode_frame(bytes)? {
        Frame::Args(args) => Ok(args),
        other => Err(unexpected(FrameKind::Args, other.kind())),
    }
}

/// Decode a frame that must be a Payload frame.
pub fn decode_payload(bytes: &[u8]) -> CodecResult<Payload> {
    match decode_frame(bytes)? {
        Frame::Payload(payload) => Ok(payload),
        other => Err(unexpected(FrameKind::Payload, other.kind())),
    }
}

/// Decode the reply to a call: a payload, or the message of an error frame.
pub fn decode_response(bytes: &[u8]) -> CodecResult<Result<Payload, String>> {
    match decode_frame(bytes)? {
        Frame::Payload(payload) => Ok(Ok(payload)),
        Frame::Error(message) => Ok(Err(message)),
        Frame::Args(_) => Err(unexpected(FrameKind::Payload, FrameKind::Args)),
    }
}

fn unexpected(expected: FrameKind, found: FrameKind) -> CodecError {
    CodecError::UnexpectedFrame {
        expected: expected.name(),
        found: found.name(),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Decoder
// ══════════════════════════════════════════════════════════════════════════════

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// An error message: UTF-8 text running to the end of the frame.
    fn message(&mut self) -> CodecResult<String> {
        let offset = self.pos;
        let text = std::str::from_utf8(&self.bytes[offset..])
            .map_err(|e| CodecError::InvalidUtf8 {
                offset: offset + e.valid_up_to(),
            })?;
        self.pos = self.bytes.len();
        Ok(text.to_string())
    }

    fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CodecError::TrailingBytes {
                offset: self.pos,
                remaining,
            }),
        }
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> CodecResult<usize> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    /// Read an element count; every element needs at least `min_size` bytes.
    fn count(&mut self, min_size: usize) -> CodecResult<usize> {
        let offset = self.pos;
        let declared = self.u32()?;
        let remaining = self.remaining();
        if declared.saturating_mul(min_size) > remaining {
            return Err(CodecError::LengthOverflow {
                offset,
                declared,
                remaining,
            });
        }
        Ok(declared)
    }

    fn string(&mut self) -> CodecResult<String> {
        let len = self.u32()?;
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    fn args(&mut self) -> CodecResult<Args> {
        let count = self.count(1)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.value(0)?);
        }
        Ok(Args::from(values))
    }

    fn payload(&mut self) -> CodecResult<Payload> {
        let data = self.value(0)?;
        let count = self.count(2 * LEN_SIZE)?;
        let mut meta = Meta::new();
        for _ in 0..count {
            let key = self.string()?;
            let value = self.string()?;
            meta.insert(key, value);
        }
        Ok(Payload { data, meta })
    }

    fn value(&mut self, depth: usize) -> CodecResult<Value> {
        let offset = self.pos;
        let tag = self.u8()?;
        let value = match tag {
            TAG_NIL => Value::Nil,
            TAG_BOOL => match self.u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                byte => {
                    return Err(CodecError::InvalidBool {
                        offset: offset + 1,
                        byte,
                    })
                }
            },
            TAG_INT => Value::Int(i64::from_le_bytes(self.array()?)),
            TAG_FLOAT => Value::Float(f64::from_bits(u64::from_le_bytes(self.array()?))),
            TAG_STRING => Value::String(self.string()?),
            TAG_BYTES => {
                let len = self.u32()?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            TAG_LIST => {
                self.check_depth(depth, offset)?;
                let count = self.count(1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                Value::List(items)
            }
            TAG_MAP => {
                self.check_depth(depth, offset)?;
                let count = self.count(2)?;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let key_offset = self.pos;
                    let key = match self.value(depth + 1)? {
                        Value::String(key) => key,
                        _ => return Err(CodecError::NonStringKey { offset: key_offset }),
                    };
                    let item = self.value(depth + 1)?;
                    entries.insert(key, item);
                }
                Value::Map(entries)
            }
            tag => return Err(CodecError::UnknownTag { offset, tag }),
        };
        Ok(value)
    }

    fn check_depth(&self, depth: usize, offset: usize) -> CodecResult<()> {
        if depth >= MAX_DEPTH {
            return Err(CodecError::DepthExceeded {
                offset,
                limit: MAX_DEPTH,
            });
        }
        Ok(())
    }
}
