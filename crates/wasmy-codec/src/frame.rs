//! Decoded frame representation.

use std::fmt;

use wasmy_types::{Args, Payload};

use crate::tags::{FRAME_ARGS, FRAME_ERROR, FRAME_PAYLOAD};

/// The kind byte at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Args,
    Payload,
    Error,
}

impl FrameKind {
    pub fn byte(self) -> u8 {
        match self {
            FrameKind::Args => FRAME_ARGS,
            FrameKind::Payload => FRAME_PAYLOAD,
            FrameKind::Error => FRAME_ERROR,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FRAME_ARGS => Some(FrameKind::Args),
            FRAME_PAYLOAD => Some(FrameKind::Payload),
            FRAME_ERROR => Some(FrameKind::Error),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameKind::Args => "args",
            FrameKind::Payload => "payload",
            FrameKind::Error => "error",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One complete decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Args(Args),
    Payload(Payload),
    Error(String),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Args(_) => FrameKind::Args,
            Frame::Payload(_) => FrameKind::Payload,
            Frame::Error(_) => FrameKind::Error,
        }
    }
}
