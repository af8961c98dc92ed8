//! Shared types for wasmy.
//!
//! This crate defines the dynamically-typed [`Value`] that crosses the
//! host/guest boundary, the two frame bodies built from it ([`Args`] and
//! [`Payload`]), the protocol constants both sides agree on, and the error
//! types shared by the codec, the guest dispatcher and the host runner.

mod args;
mod error;
mod payload;
pub mod protocol;
mod value;

pub use args::{ArgError, Args};
pub use error::{BufferOverflow, CodecError, CodecResult};
pub use payload::{Meta, Payload};
pub use protocol::{BufferKind, BUFFER_SIZE};
pub use value::Value;

/// Build an [`Args`] list from anything convertible into [`Value`].
///
/// ```
/// use wasmy_types::{args, Value};
///
/// let a = args!["martin", 42, true];
/// assert_eq!(a.get(1), Some(&Value::Int(42)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from(vec![$($crate::Value::from($value)),+])
    };
}
