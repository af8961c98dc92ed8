//! Host call bridge: serves guest calls to imported host functions.
//!
//! Each registered host function is linked as an `(i32) -> i32` import.
//! When the guest calls it with the length of the Args frame it left in
//! host-input, the bridge decodes the frame, runs the function, and writes
//! a Payload or Error frame to host-output, returning that frame's length.
//!
//! Decode failures and host-function failures become error frames. Only
//! faults in the guest itself (a trapping accessor, out-of-range memory)
//! trap the calling instance.

use wasmi::{Caller, Linker, Memory, TypedFunc};
use wasmy_codec::{decode_args, encode_error_bounded, encode_payload_bounded};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::host::{HostFn, HostFunctions};

/// Store data for one runner's instance.
#[derive(Default)]
pub struct HostState {
    /// Set once warm-up has resolved the guest's boilerplate.
    pub(crate) bridge: Option<BridgeHandles>,
}

/// What the bridge needs to reach the host-side buffers.
#[derive(Clone)]
pub(crate) struct BridgeHandles {
    pub memory: Memory,
    pub host_input: TypedFunc<(), i32>,
    pub host_output: TypedFunc<(), i32>,
    pub capacity: usize,
}

/// Define every host function in `linker` under the configured namespace.
pub(crate) fn link(
    linker: &mut Linker<HostState>,
    functions: &HostFunctions,
    config: &RunnerConfig,
) -> RunnerResult<()> {
    for (name, f) in functions.iter() {
        let field = config.import_field(name);
        let name = name.to_string();
        let f = HostFn::clone(f);
        linker
            .func_wrap(
                &config.import_module,
                &field,
                move |mut caller: Caller<'_, HostState>, len: i32| -> Result<i32, wasmi::Error> {
                    serve(&mut caller, &name, &f, len)
                },
            )
            .map_err(|e| RunnerError::Instantiation(e.to_string()))?;
    }
    Ok(())
}

/// Handle one guest → host call.
fn serve(
    caller: &mut Caller<'_, HostState>,
    name: &str,
    f: &HostFn,
    len: i32,
) -> Result<i32, wasmi::Error> {
    let handles = caller
        .data()
        .bridge
        .clone()
        .ok_or_else(|| wasmi::Error::new(format!("host function {name} called before warm-up")))?;
    let input_ptr = pointer(caller, &handles.host_input)?;
    let output_ptr = pointer(caller, &handles.host_output)?;

    let frame = match respond(caller, &handles, name, f, input_ptr, len) {
        Ok(frame) => frame,
        Err(message) => {
            tracing::warn!(
                target: "wasmy::bridge",
                function = name,
                error = %message,
                "host function failed"
            );
            encode_error_bounded(&message, handles.capacity)
        }
    };

    handles
        .memory
        .write(&mut *caller, output_ptr, &frame)
        .map_err(|e| wasmi::Error::new(format!("host-output write failed: {e}")))?;
    Ok(frame.len() as i32)
}

/// Decode, invoke, encode. An `Err` carries the message for an error frame.
fn respond(
    caller: &mut Caller<'_, HostState>,
    handles: &BridgeHandles,
    name: &str,
    f: &HostFn,
    input_ptr: usize,
    len: i32,
) -> Result<Vec<u8>, String> {
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= handles.capacity)
        .ok_or_else(|| {
            format!(
                "host-input length {len} outside buffer capacity of {}",
                handles.capacity
            )
        })?;

    let mut input = vec![0u8; len];
    handles
        .memory
        .read(&*caller, input_ptr, &mut input)
        .map_err(|e| format!("host-input read failed: {e}"))?;
    let args = decode_args(&input).map_err(|e| e.to_string())?;

    tracing::debug!(
        target: "wasmy::bridge",
        function = name,
        args = args.len(),
        "calling host function"
    );
    let payload = f(&args).map_err(|e| e.to_string())?;
    encode_payload_bounded(&payload, handles.capacity).map_err(|e| e.to_string())
}

fn pointer(
    caller: &mut Caller<'_, HostState>,
    accessor: &TypedFunc<(), i32>,
) -> Result<usize, wasmi::Error> {
    let ptr = accessor.call(&mut *caller, ())?;
    usize::try_from(ptr).map_err(|_| wasmi::Error::new(format!("negative buffer pointer {ptr}")))
}
