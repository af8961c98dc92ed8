//! Emits small guest modules that speak the wasmy managed calling convention.
//!
//! Real guests are compiled from a guest-side SDK; the modules built here
//! are hand-assembled with `wasm-encoder` so hosts can be exercised without
//! a WebAssembly toolchain.
//!
//! ## Exports
//! - `memory`
//! - `inputBuffer`, `outputBuffer`, `hostInputBuffer`, `hostOutputBuffer`
//! - `bufferCapacity` (unless disabled)
//! - one `(input_len: i32) -> i32` function per [`GuestFunction`]
//!
//! ## Imports
//! - `<module>.<prefix><name>: (i32) -> i32` for every relayed host function,
//!   `env.main.<name>` by default

pub mod body;
pub mod builder;
pub mod error;
pub mod layout;

pub use builder::{GuestFunction, GuestModuleBuilder};
pub use error::{GuestGenError, GuestGenResult};
pub use layout::Layout;
