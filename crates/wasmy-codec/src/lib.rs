//! Self-describing binary frames for the managed calling convention.
//!
//! Every buffer exchanged between host and guest holds exactly one frame.
//! The first byte names the frame kind (see [`tags`]) so a reader can tell a
//! successful payload from an error report without guessing:
//!
//! ```text
//! Args    : 0x01 | u32 count | value*
//! Payload : 0x02 | value (data) | u32 meta_count | (str key, str value)*
//! Error   : 0x03 | UTF-8 message ...
//! ```
//!
//! Values are tag-prefixed and may nest; see [`tags`] for the value layouts.
//! All integers are little-endian.

mod decode;
mod encode;
mod frame;
pub mod tags;

pub use decode::{decode_args, decode_frame, decode_payload, decode_response};
pub use encode::{
    encode_args, encode_args_bounded, encode_error, encode_error_bounded, encode_payload,
    encode_payload_bounded,
};
pub use frame::{Frame, FrameKind};
pub use wasmy_types::{BufferOverflow, CodecError, CodecResult};
