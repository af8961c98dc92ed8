//! Frame encoding.

use std::fmt;

use wasmy_types::{Args, BufferOverflow, CodecError, CodecResult, Payload, Value};

use crate::frame::FrameKind;
use crate::tags::*;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Encode an argument list as an Args frame.
pub fn encode_args(args: &Args) -> CodecResult<Vec<u8>> {
    let root = Position::root("args");
    let mut enc = Encoder::new(FrameKind::Args);
    enc.len(args.len(), &root)?;
    for (i, value) in args.iter().enumerate() {
        enc.value(value, &root.index(i), 0)?;
    }
    Ok(enc.finish())
}

/// Encode a payload as a Payload frame.
pub fn encode_payload(payload: &Payload) -> CodecResult<Vec<u8>> {
    let data = Position::root("data");
    let meta = Position::root("meta");
    let mut enc = Encoder::new(FrameKind::Payload);
    enc.value(&payload.data, &data, 0)?;
    enc.len(payload.meta.len(), &meta)?;
    for (key, value) in &payload.meta {
        let at = meta.key(key);
        enc.str(key, &at)?;
        enc.str(value, &at)?;
    }
    Ok(enc.finish())
}

/// Encode an Args frame, rejecting it if it exceeds `capacity` bytes.
pub fn encode_args_bounded(args: &Args, capacity: usize) -> CodecResult<Vec<u8>> {
    check_capacity(encode_args(args)?, capacity)
}

/// Encode a Payload frame, rejecting it if it exceeds `capacity` bytes.
pub fn encode_payload_bounded(payload: &Payload, capacity: usize) -> CodecResult<Vec<u8>> {
    check_capacity(encode_payload(payload)?, capacity)
}

/// Encode an Error frame carrying `message`.
pub fn encode_error(message: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + message.len());
    out.push(FrameKind::Error.byte());
    out.extend_from_slice(message.as_bytes());
    out
}

/// Encode an Error frame no longer than `capacity` bytes.
///
/// Unlike payloads, error reports are shortened rather than rejected: the
/// message is cut at the last UTF-8 boundary that fits. A zero capacity
/// yields an empty vector.
pub fn encode_error_bounded(message: &str, capacity: usize) -> Vec<u8> {
    if capacity == 0 {
        return Vec::new();
    }
    let mut end = message.len().min(capacity - 1);
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    encode_error(&message[..end])
}

fn check_capacity(frame: Vec<u8>, capacity: usize) -> CodecResult<Vec<u8>> {
    if frame.len() > capacity {
        return Err(BufferOverflow {
            len: frame.len(),
            capacity,
        }
        .into());
    }
    Ok(frame)
}

// ══════════════════════════════════════════════════════════════════════════════
// Position: path to the value being encoded, for error messages
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Segment<'a> {
    Root(&'static str),
    Index(usize),
    Key(&'a str),
}

struct Position<'a> {
    parent: Option<&'a Position<'a>>,
    segment: Segment<'a>,
}

impl<'a> Position<'a> {
    fn root(name: &'static str) -> Self {
        Self {
            parent: None,
            segment: Segment::Root(name),
        }
    }

    fn index(&'a self, i: usize) -> Position<'a> {
        Position {
            parent: Some(self),
            segment: Segment::Index(i),
        }
    }

    fn key(&'a self, key: &'a str) -> Position<'a> {
        Position {
            parent: Some(self),
            segment: Segment::Key(key),
        }
    }
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            write!(f, "{parent}")?;
        }
        match self.segment {
            Segment::Root(name) => write!(f, "{name}"),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Key(key) => write!(f, ".{key}"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Encoder
// ══════════════════════════════════════════════════════════════════════════════

struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn new(kind: FrameKind) -> Self {
        Self {
            buf: vec![kind.byte()],
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn len(&mut self, len: usize, at: &Position<'_>) -> CodecResult<()> {
        let len = u32::try_from(len).map_err(|_| CodecError::Unsupported {
            position: at.to_string(),
            reason: format!("length {len} does not fit in a u32 prefix"),
        })?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn str(&mut self, s: &str, at: &Position<'_>) -> CodecResult<()> {
        self.len(s.len(), at)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Lists and maps are capped at the decoder's [`MAX_DEPTH`], so every
    /// frame produced here decodes.
    fn value(&mut self, value: &Value, at: &Position<'_>, depth: usize) -> CodecResult<()> {
        match value {
            Value::Nil => self.buf.push(TAG_NIL),
            Value::Bool(b) => {
                self.buf.push(TAG_BOOL);
                self.buf.push(u8::from(*b));
            }
            Value::Int(n) => {
                self.buf.push(TAG_INT);
                self.buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Float(n) => {
                self.buf.push(TAG_FLOAT);
                self.buf.extend_from_slice(&n.to_bits().to_le_bytes());
            }
            Value::String(s) => {
                self.buf.push(TAG_STRING);
                self.str(s, at)?;
            }
            Value::Bytes(bytes) => {
                self.buf.push(TAG_BYTES);
                self.len(bytes.len(), at)?;
                self.buf.extend_from_slice(bytes);
            }
            Value::List(items) => {
                check_depth(depth, at)?;
                self.buf.push(TAG_LIST);
                self.len(items.len(), at)?;
                for (i, item) in items.iter().enumerate() {
                    self.value(item, &at.index(i), depth + 1)?;
                }
            }
            Value::Map(entries) => {
                check_depth(depth, at)?;
                self.buf.push(TAG_MAP);
                self.len(entries.len(), at)?;
                for (key, item) in entries {
                    let child = at.key(key);
                    self.buf.push(TAG_STRING);
                    self.str(key, &child)?;
                    self.value(item, &child, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

fn check_depth(depth: usize, at: &Position<'_>) -> CodecResult<()> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::Unsupported {
            position: at.to_string(),
            reason: format!("nesting deeper than {MAX_DEPTH}"),
        });
    }
    Ok(())
}
