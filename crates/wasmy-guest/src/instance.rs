//! The guest's buffer set and call dispatch.

use wasmy_codec::{decode_args, encode_error_bounded, encode_payload_bounded};
use wasmy_types::{Args, BufferKind, Payload, BUFFER_SIZE};

use crate::buffer::Buffer;
use crate::channel::HostChannel;
use crate::error::GuestResult;

// ══════════════════════════════════════════════════════════════════════════════
// Dispatch state
// ══════════════════════════════════════════════════════════════════════════════

/// Progress of a single managed call through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    AwaitingInput,
    Decoded,
    Invoked,
    Encoded,
    Done,
}

/// What happened during the most recent [`GuestInstance::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Always [`DispatchStage::Done`] once dispatch returns.
    pub stage: DispatchStage,
    /// The last stage reached before a failure, if the call failed.
    pub failed_after: Option<DispatchStage>,
    /// Length of the frame left in guest-output.
    pub output_len: usize,
}

impl DispatchOutcome {
    pub fn is_error(&self) -> bool {
        self.failed_after.is_some()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// GuestInstance
// ══════════════════════════════════════════════════════════════════════════════

/// The four managed buffers of one guest module instance.
///
/// Every exported entry point receives the instance explicitly, so several
/// instances can coexist without sharing buffers.
pub struct GuestInstance {
    guest_input: Buffer,
    guest_output: Buffer,
    host_input: Buffer,
    host_output: Buffer,
    last_dispatch: Option<DispatchOutcome>,
}

impl GuestInstance {
    pub const fn new() -> Self {
        Self {
            guest_input: Buffer::new(),
            guest_output: Buffer::new(),
            host_input: Buffer::new(),
            host_output: Buffer::new(),
            last_dispatch: None,
        }
    }

    pub const fn capacity(&self) -> usize {
        BUFFER_SIZE
    }

    pub fn buffer(&self, kind: BufferKind) -> &Buffer {
        match kind {
            BufferKind::GuestInput => &self.guest_input,
            BufferKind::GuestOutput => &self.guest_output,
            BufferKind::HostInput => &self.host_input,
            BufferKind::HostOutput => &self.host_output,
        }
    }

    pub fn buffer_mut(&mut self, kind: BufferKind) -> &mut Buffer {
        match kind {
            BufferKind::GuestInput => &mut self.guest_input,
            BufferKind::GuestOutput => &mut self.guest_output,
            BufferKind::HostInput => &mut self.host_input,
            BufferKind::HostOutput => &mut self.host_output,
        }
    }

    /// Pointer returned by the boilerplate export for `kind`.
    pub fn buffer_ptr(&self, kind: BufferKind) -> *const u8 {
        self.buffer(kind).as_ptr()
    }

    pub fn last_dispatch(&self) -> Option<&DispatchOutcome> {
        self.last_dispatch.as_ref()
    }

    // ── Host → guest ─────────────────────────────────────────────────────

    /// Run `f` as a managed export.
    ///
    /// Decodes `input_len` bytes of guest-input as [`Args`], calls `f`, and
    /// writes either a Payload frame or an Error frame to guest-output.
    /// Returns the length of the frame written; guest-output always holds a
    /// complete frame when this returns.
    ///
    /// `f` also receives a [`HostChannel`] for calling host imports.
    pub fn dispatch<F, R>(&mut self, input_len: usize, f: F) -> usize
    where
        F: FnOnce(Args, &mut HostChannel<'_>) -> GuestResult<R>,
        R: Into<Payload>,
    {
        let mut stage = DispatchStage::AwaitingInput;
        let result = self.run(input_len, f, &mut stage);

        let (output_len, failed_after) = match result {
            Ok(len) => (len, None),
            Err(err) => (self.write_error(&err.to_string()), Some(stage)),
        };

        self.last_dispatch = Some(DispatchOutcome {
            stage: DispatchStage::Done,
            failed_after,
            output_len,
        });
        output_len
    }

    fn run<F, R>(&mut self, input_len: usize, f: F, stage: &mut DispatchStage) -> GuestResult<usize>
    where
        F: FnOnce(Args, &mut HostChannel<'_>) -> GuestResult<R>,
        R: Into<Payload>,
    {
        let args = decode_args(self.guest_input.read(input_len)?)?;
        *stage = DispatchStage::Decoded;

        let mut channel = HostChannel::new(&mut self.host_input, &self.host_output);
        let payload: Payload = f(args, &mut channel)?.into();
        *stage = DispatchStage::Invoked;

        let frame = encode_payload_bounded(&payload, self.guest_output.capacity())?;
        *stage = DispatchStage::Encoded;

        Ok(self.guest_output.write(&frame)?)
    }

    fn write_error(&mut self, message: &str) -> usize {
        let frame = encode_error_bounded(message, self.guest_output.capacity());
        // A bounded error frame always fits.
        self.guest_output.write(&frame).unwrap_or(0)
    }

    // ── Guest → host ─────────────────────────────────────────────────────

    /// Host-call view for code running outside a dispatch.
    pub fn host_channel(&mut self) -> HostChannel<'_> {
        HostChannel::new(&mut self.host_input, &self.host_output)
    }
}

impl Default for GuestInstance {
    fn default() -> Self {
        Self::new()
    }
}
