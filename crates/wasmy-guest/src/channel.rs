//! Guest → host calls through the host-input/host-output buffers.

use wasmy_codec::{decode_response, encode_args_bounded};
use wasmy_types::{Args, Payload};

use crate::buffer::Buffer;
use crate::error::{GuestError, GuestResult};

/// Borrowed view of the two host-call buffers.
///
/// Handed to managed functions during [`crate::GuestInstance::dispatch`] so
/// they can call host imports while guest-input/guest-output are in use.
pub struct HostChannel<'a> {
    input: &'a mut Buffer,
    output: &'a Buffer,
}

impl<'a> HostChannel<'a> {
    pub(crate) fn new(input: &'a mut Buffer, output: &'a Buffer) -> Self {
        Self { input, output }
    }

    /// Call a host import with managed arguments.
    ///
    /// `import` is the raw imported function: it receives the length of the
    /// Args frame in host-input and returns the length of the frame the host
    /// left in host-output.
    pub fn call_import<I>(&mut self, import: I, args: &Args) -> GuestResult<Payload>
    where
        I: FnOnce(usize) -> usize,
    {
        let input_len = self.prepare_import(args)?;
        let output_len = import(input_len);
        self.finish_import(output_len)
    }

    /// First half of [`Self::call_import`]: write `args` into host-input.
    pub fn prepare_import(&mut self, args: &Args) -> GuestResult<usize> {
        let frame = encode_args_bounded(args, self.input.capacity())?;
        Ok(self.input.write(&frame)?)
    }

    /// Second half of [`Self::call_import`]: read the host's reply.
    pub fn finish_import(&self, output_len: usize) -> GuestResult<Payload> {
        let frame = self.output.read(output_len)?;
        decode_response(frame)?.map_err(GuestError::Host)
    }
}
