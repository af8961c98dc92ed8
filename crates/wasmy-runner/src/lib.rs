//! Host side of the wasmy managed calling convention.
//!
//! # Architecture
//!
//! A guest module exposes four fixed-capacity buffers in its linear memory
//! through boilerplate exports (`inputBuffer`, `outputBuffer`,
//! `hostInputBuffer`, `hostOutputBuffer`). Every managed call moves one
//! frame in each direction:
//!
//! - **host → guest**: [`Runner::call`] writes an Args frame to
//!   guest-input, invokes the export with the frame length, and decodes
//!   the Payload or Error frame the guest left in guest-output.
//! - **guest → host**: the guest writes an Args frame to host-input and
//!   calls an imported host function; the [`bridge`] runs the registered
//!   [`HostFunctions`] entry and answers in host-output.
//!
//! Modules are compiled once into a [`GuestModule`] and instantiated per
//! [`Runner`]; runners share nothing mutable and may run on separate
//! threads.
//!
//! Logging goes through `tracing` under the `wasmy::*` targets.

pub mod bridge;
pub mod config;
pub mod demo;
pub mod error;
pub mod host;
pub mod module;
pub mod runner;

pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use host::{HostError, HostFn, HostFunctions};
pub use module::{EngineOptions, GuestModule, ImportDecl};
pub use runner::Runner;

pub use wasmy_types::{args, Args, BufferKind, Meta, Payload, Value};
