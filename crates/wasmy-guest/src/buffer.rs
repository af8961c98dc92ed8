//! Fixed-capacity byte regions.

use wasmy_types::{BufferOverflow, BUFFER_SIZE};

/// One fixed-capacity region of guest linear memory.
///
/// Writes are all-or-nothing: a frame that does not fit is rejected and the
/// previous contents are left untouched.
pub struct Buffer {
    bytes: [u8; BUFFER_SIZE],
}

impl Buffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; BUFFER_SIZE],
        }
    }

    pub const fn capacity(&self) -> usize {
        BUFFER_SIZE
    }

    /// Copy a complete frame to the start of the region; returns its length.
    pub fn write(&mut self, frame: &[u8]) -> Result<usize, BufferOverflow> {
        if frame.len() > BUFFER_SIZE {
            return Err(BufferOverflow {
                len: frame.len(),
                capacity: BUFFER_SIZE,
            });
        }
        self.bytes[..frame.len()].copy_from_slice(frame);
        Ok(frame.len())
    }

    /// The first `len` bytes, as written by the other side.
    pub fn read(&self, len: usize) -> Result<&[u8], BufferOverflow> {
        self.bytes.get(..len).ok_or(BufferOverflow {
            len,
            capacity: BUFFER_SIZE,
        })
    }

    /// Address of the region, as returned by the boilerplate exports.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
