//! Guest-side half of the wasmy managed calling convention.
//!
//! A guest module owns one [`GuestInstance`] per independent caller and
//! exposes its four buffers plus any number of managed functions:
//!
//! ## Exports (boilerplate)
//! - `inputBuffer() → ptr`, `outputBuffer() → ptr`
//! - `hostInputBuffer() → ptr`, `hostOutputBuffer() → ptr`
//! - `memory`
//!
//! ## Exports (managed functions)
//! - `name(input_len) → output_len`, implemented with
//!   [`GuestInstance::dispatch`]
//!
//! ## Imports
//! - `env.main.<Name>(input_len) → output_len`, called through
//!   [`HostChannel::call_import`]
//!
//! ```ignore
//! use wasmy_guest::{GuestInstance, GuestResult, HostChannel};
//! use wasmy_types::{Args, BufferKind, Value};
//!
//! static mut INSTANCE: GuestInstance = GuestInstance::new();
//!
//! fn instance() -> &'static mut GuestInstance {
//!     // Single-threaded guest; every export runs to completion.
//!     unsafe { &mut *std::ptr::addr_of_mut!(INSTANCE) }
//! }
//!
//! #[no_mangle]
//! pub extern "C" fn inputBuffer() -> *const u8 {
//!     instance().buffer_ptr(BufferKind::GuestInput)
//! }
//! // ... outputBuffer, hostInputBuffer, hostOutputBuffer likewise
//!
//! #[link(wasm_import_module = "env")]
//! extern "C" {
//!     #[link_name = "main.PrintHello"]
//!     fn print_hello(len: i32) -> i32;
//! }
//!
//! fn greet(args: Args, host: &mut HostChannel<'_>) -> GuestResult<Value> {
//!     let name = args.str_at(0)?;
//!     let reply = host.call_import(
//!         |len| unsafe { print_hello(len as i32) as usize },
//!         &Args::from(vec![Value::from(name)]),
//!     )?;
//!     Ok(reply.data)
//! }
//!
//! #[no_mangle]
//! pub extern "C" fn greet_export(input_len: i32) -> i32 {
//!     instance().dispatch(input_len as usize, greet) as i32
//! }
//! ```

mod buffer;
mod channel;
mod error;
mod instance;

pub use buffer::Buffer;
pub use channel::HostChannel;
pub use error::{GuestError, GuestResult};
pub use instance::{DispatchOutcome, DispatchStage, GuestInstance};
