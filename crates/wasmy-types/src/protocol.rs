//! Protocol constants shared by host and guest.
//!
//! Both sides of the managed calling convention must agree on these names
//! and sizes bit-for-bit; a guest built against a different capacity can
//! advertise it through the optional [`EXPORT_BUFFER_CAPACITY`] export.

use std::fmt;

/// Capacity `C` of each of the four buffers, in bytes.
pub const BUFFER_SIZE: usize = 1024;

/// Linear memory export.
pub const EXPORT_MEMORY: &str = "memory";
/// `() -> i32` pointer to the guest-input region (Args for guest exports).
pub const EXPORT_INPUT_BUFFER: &str = "inputBuffer";
/// `() -> i32` pointer to the guest-output region (Payload from guest exports).
pub const EXPORT_OUTPUT_BUFFER: &str = "outputBuffer";
/// `() -> i32` pointer to the host-input region (Args for host imports).
pub const EXPORT_HOST_INPUT_BUFFER: &str = "hostInputBuffer";
/// `() -> i32` pointer to the host-output region (Payload from host imports).
pub const EXPORT_HOST_OUTPUT_BUFFER: &str = "hostOutputBuffer";
/// Optional `() -> i32` export advertising the guest's buffer capacity.
pub const EXPORT_BUFFER_CAPACITY: &str = "bufferCapacity";

/// Default import module for host functions.
pub const DEFAULT_IMPORT_MODULE: &str = "env";
/// Default prefix prepended to a host function's name to form the import field.
pub const DEFAULT_IMPORT_PREFIX: &str = "main.";

/// One of the four fixed-capacity regions in guest linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Written by the host, read by a guest export.
    GuestInput,
    /// Written by a guest export, read by the host.
    GuestOutput,
    /// Written by the guest, read by a host import.
    HostInput,
    /// Written by a host import, read by the guest.
    HostOutput,
}

impl BufferKind {
    /// All regions, in accessor export order.
    pub const ALL: [BufferKind; 4] = [
        BufferKind::GuestInput,
        BufferKind::GuestOutput,
        BufferKind::HostInput,
        BufferKind::HostOutput,
    ];

    /// Name of the guest export that yields this region's pointer.
    pub fn export_name(self) -> &'static str {
        match self {
            BufferKind::GuestInput => EXPORT_INPUT_BUFFER,
            BufferKind::GuestOutput => EXPORT_OUTPUT_BUFFER,
            BufferKind::HostInput => EXPORT_HOST_INPUT_BUFFER,
            BufferKind::HostOutput => EXPORT_HOST_OUTPUT_BUFFER,
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BufferKind::GuestInput => "guest-input",
            BufferKind::GuestOutput => "guest-output",
            BufferKind::HostInput => "host-input",
            BufferKind::HostOutput => "host-output",
        };
        f.write_str(name)
    }
}
