//! Linear-memory layout and fixed indices of generated guests.
//!
//! ```text
//! 0                BUFFER_BASE
//! | reserved      | guest-input | guest-output | host-input | host-output | data ...
//!                  <- capacity -><- capacity  -><- capacity -><- capacity ->
//! ```
//!
//! Constant frames (for `Constant` and `Fail` functions) live in the data
//! region after the four buffers.

use wasmy_types::BufferKind;

/// First byte of the guest-input region.
pub const BUFFER_BASE: u32 = 1024;

/// WASM page size.
pub const PAGE_SIZE: u64 = 65536;

/// Custom section name for wasmy metadata.
pub const CUSTOM_SECTION_NAME: &str = "wasmy";
/// Generator version embedded in the custom section.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── WASM type indices ────────────────────────────────────────────────────────
// (order must match emit_types in builder.rs)

/// `() -> i32`: buffer accessors and `bufferCapacity`.
pub const TYPE_VOID_I32: u32 = 0;
/// `(i32) -> i32`: managed functions and host imports.
pub const TYPE_I32_I32: u32 = 1;

/// Functions emitted before any managed function: the four buffer
/// accessors followed by `bufferCapacity`.
pub const BOILERPLATE_FUNC_COUNT: u32 = 5;

/// Resolved region offsets for one module.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub capacity: u32,
}

impl Layout {
    pub fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    pub fn offset(&self, kind: BufferKind) -> u32 {
        let slot = match kind {
            BufferKind::GuestInput => 0,
            BufferKind::GuestOutput => 1,
            BufferKind::HostInput => 2,
            BufferKind::HostOutput => 3,
        };
        BUFFER_BASE + slot * self.capacity
    }

    /// First byte after the four buffers.
    pub fn data_start(&self) -> u32 {
        BUFFER_BASE + 4 * self.capacity
    }
}
