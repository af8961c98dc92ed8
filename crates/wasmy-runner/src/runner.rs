//! The host-side orchestrator.
//!
//! A [`Runner`] owns exactly one instance of a guest module. `warm_up`
//! instantiates it, resolves the boilerplate exports and the requested
//! functions once, and `call` then performs full request/response round
//! trips through the guest's buffers.
//!
//! `call` takes `&mut self`: one call is in flight per instance. For
//! concurrency, give every caller its own runner over a shared
//! [`GuestModule`].

use std::collections::BTreeMap;
use std::sync::Arc;

use wasmi::core::TrapCode;
use wasmi::{Instance, Linker, Memory, Store, TypedFunc};
use wasmy_codec::{decode_response, encode_args_bounded};
use wasmy_types::protocol::{EXPORT_BUFFER_CAPACITY, EXPORT_MEMORY};
use wasmy_types::{Args, BufferKind, Payload};

use crate::bridge::{self, BridgeHandles, HostState};
use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::host::HostFunctions;
use crate::module::GuestModule;

// ══════════════════════════════════════════════════════════════════════════════
// Runner
// ══════════════════════════════════════════════════════════════════════════════

pub struct Runner {
    config: RunnerConfig,
    host_functions: Arc<HostFunctions>,
    warm: Option<WarmInstance>,
}

impl Runner {
    pub fn new(config: RunnerConfig, host_functions: HostFunctions) -> Self {
        Self {
            config,
            host_functions: Arc::new(host_functions),
            warm: None,
        }
    }

    /// A runner with the default configuration.
    pub fn with_host_functions(host_functions: HostFunctions) -> Self {
        Self::new(RunnerConfig::default(), host_functions)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn host_functions(&self) -> &HostFunctions {
        &self.host_functions
    }

    pub fn is_warm(&self) -> bool {
        self.warm.is_some()
    }

    /// Buffer capacity in effect: the guest's advertised value once warm.
    pub fn capacity(&self) -> usize {
        self.warm
            .as_ref()
            .map_or(self.config.buffer_capacity, |warm| warm.capacity)
    }

    /// Functions resolved at warm-up, sorted by name.
    pub fn exports(&self) -> Vec<&str> {
        self.warm
            .as_ref()
            .map(|warm| warm.exports.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    // ── Warm-up ──────────────────────────────────────────────────────────

    /// Instantiate `module` and resolve `exports` for later calls.
    ///
    /// Nothing is kept unless every step succeeds, so a failed warm-up
    /// leaves the runner cold. Warming a warm runner fails with
    /// [`RunnerError::AlreadyWarm`].
    pub fn warm_up(&mut self, module: &GuestModule, exports: &[&str]) -> RunnerResult<()> {
        if self.warm.is_some() {
            return Err(RunnerError::AlreadyWarm);
        }
        self.config.validate()?;
        let fuel_metering = module.options().fuel_metering;
        if self.config.fuel_per_call.is_some() && !fuel_metering {
            return Err(RunnerError::Config(
                "fuel_per_call requires a module compiled with fuel metering".into(),
            ));
        }
        self.check_imports(module)?;

        let mut store = Store::new(module.engine(), HostState::default());
        if fuel_metering {
            set_fuel(&mut store, self.config.fuel_per_call.unwrap_or(u64::MAX))?;
        }
        let mut linker = Linker::<HostState>::new(module.engine());
        bridge::link(&mut linker, &self.host_functions, &self.config)?;
        let instance = linker
            .instantiate(&mut store, module.module())
            .and_then(|pre| pre.start(&mut store))
            .map_err(|e| RunnerError::Instantiation(e.to_string()))?;

        let memory = instance
            .get_memory(&store, EXPORT_MEMORY)
            .ok_or_else(|| RunnerError::MissingBoilerplate(EXPORT_MEMORY.to_string()))?;
        let accessors = Accessors::resolve(&instance, &store)?;
        let capacity = self.resolve_capacity(&instance, &mut store)?;

        let mut functions = BTreeMap::new();
        for &name in exports {
            let func = instance
                .get_func(&store, name)
                .ok_or_else(|| RunnerError::ExportNotFound(name.to_string()))?;
            let typed = func
                .typed::<i32, i32>(&store)
                .map_err(|_| RunnerError::ExportSignature(name.to_string()))?;
            functions.insert(name.to_string(), typed);
        }

        let mut warm = WarmInstance {
            store,
            memory,
            accessors,
            exports: functions,
            capacity,
            fuel_per_call: self.config.fuel_per_call,
        };
        warm.check_regions()?;
        warm.store.data_mut().bridge = Some(BridgeHandles {
            memory,
            host_input: warm.accessors.host_input.clone(),
            host_output: warm.accessors.host_output.clone(),
            capacity,
        });

        tracing::debug!(
            target: "wasmy::runner",
            exports = ?warm.exports.keys().collect::<Vec<_>>(),
            capacity,
            "warm-up complete"
        );
        self.warm = Some(warm);
        Ok(())
    }

    /// Every import must be a function this runner provides.
    fn check_imports(&self, module: &GuestModule) -> RunnerResult<()> {
        for import in module.imports() {
            let provided = import.is_function
                && import.module == self.config.import_module
                && import
                    .name
                    .strip_prefix(&self.config.import_prefix)
                    .is_some_and(|name| self.host_functions.contains(name));
            if !provided {
                tracing::warn!(
                    target: "wasmy::runner",
                    module = %import.module,
                    name = %import.name,
                    "unresolved guest import"
                );
                return Err(RunnerError::Link {
                    module: import.module,
                    name: import.name,
                });
            }
        }
        Ok(())
    }

    fn resolve_capacity(
        &self,
        instance: &Instance,
        store: &mut Store<HostState>,
    ) -> RunnerResult<usize> {
        let Some(func) = instance.get_func(&*store, EXPORT_BUFFER_CAPACITY) else {
            return Ok(self.config.buffer_capacity);
        };
        let advertised = func
            .typed::<(), i32>(&*store)
            .map_err(|_| RunnerError::MissingBoilerplate(EXPORT_BUFFER_CAPACITY.to_string()))?
            .call(&mut *store, ())
            .map_err(|e| RunnerError::Instantiation(e.to_string()))?;
        match usize::try_from(advertised) {
            Ok(capacity) if capacity > 0 => Ok(capacity),
            _ => Err(RunnerError::Config(format!(
                "guest advertises invalid buffer capacity {advertised}"
            ))),
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────

    /// Call the guest function `name` with `args`.
    pub fn call(&mut self, name: &str, args: &Args) -> RunnerResult<Payload> {
        let warm = self.warm.as_mut().ok_or(RunnerError::NotWarmedUp)?;
        let func = warm
            .exports
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownFunction(name.to_string()))?;
        let frame = encode_args_bounded(args, warm.capacity)?;

        if let Some(fuel) = warm.fuel_per_call {
            set_fuel(&mut warm.store, fuel)?;
        }
        let input = warm.pointer(BufferKind::GuestInput)?;
        let output = warm.pointer(BufferKind::GuestOutput)?;
        warm.memory
            .write(&mut warm.store, input, &frame)
            .map_err(|e| RunnerError::Memory(e.to_string()))?;

        tracing::debug!(
            target: "wasmy::runner",
            function = name,
            input_len = frame.len(),
            "calling guest function"
        );
        let len = func
            .call(&mut warm.store, frame.len() as i32)
            .map_err(|e| call_error(name, &e))?;
        let out_len = usize::try_from(len)
            .ok()
            .filter(|&out_len| out_len <= warm.capacity)
            .ok_or_else(|| RunnerError::InvalidOutputLength {
                function: name.to_string(),
                len,
                capacity: warm.capacity,
            })?;

        let mut reply = vec![0u8; out_len];
        warm.memory
            .read(&warm.store, output, &mut reply)
            .map_err(|e| RunnerError::Memory(e.to_string()))?;
        match decode_response(&reply)? {
            Ok(payload) => {
                tracing::debug!(
                    target: "wasmy::runner",
                    function = name,
                    output_len = out_len,
                    "guest function returned"
                );
                Ok(payload)
            }
            Err(message) => {
                tracing::warn!(
                    target: "wasmy::runner",
                    function = name,
                    error = %message,
                    "guest function reported an error"
                );
                Err(RunnerError::Guest {
                    function: name.to_string(),
                    message,
                })
            }
        }
    }

    /// Copy of one buffer region, for diagnostics.
    pub fn read_buffer(&mut self, kind: BufferKind) -> RunnerResult<Vec<u8>> {
        let warm = self.warm.as_mut().ok_or(RunnerError::NotWarmedUp)?;
        let ptr = warm.pointer(kind)?;
        let mut bytes = vec![0u8; warm.capacity];
        warm.memory
            .read(&warm.store, ptr, &mut bytes)
            .map_err(|e| RunnerError::Memory(e.to_string()))?;
        Ok(bytes)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Warm state
// ══════════════════════════════════════════════════════════════════════════════

struct Accessors {
    guest_input: TypedFunc<(), i32>,
    guest_output: TypedFunc<(), i32>,
    host_input: TypedFunc<(), i32>,
    host_output: TypedFunc<(), i32>,
}

impl Accessors {
    fn resolve(instance: &Instance, store: &Store<HostState>) -> RunnerResult<Self> {
        let get = |kind: BufferKind| {
            instance
                .get_typed_func::<(), i32>(store, kind.export_name())
                .map_err(|_| RunnerError::MissingBoilerplate(kind.export_name().to_string()))
        };
        Ok(Self {
            guest_input: get(BufferKind::GuestInput)?,
            guest_output: get(BufferKind::GuestOutput)?,
            host_input: get(BufferKind::HostInput)?,
            host_output: get(BufferKind::HostOutput)?,
        })
    }

    fn get(&self, kind: BufferKind) -> &TypedFunc<(), i32> {
        match kind {
            BufferKind::GuestInput => &self.guest_input,
            BufferKind::GuestOutput => &self.guest_output,
            BufferKind::HostInput => &self.host_input,
            BufferKind::HostOutput => &self.host_output,
        }
    }
}

struct WarmInstance {
    store: Store<HostState>,
    memory: Memory,
    accessors: Accessors,
    exports: BTreeMap<String, TypedFunc<i32, i32>>,
    capacity: usize,
    fuel_per_call: Option<u64>,
}

impl WarmInstance {
    fn pointer(&mut self, kind: BufferKind) -> RunnerResult<usize> {
        let ptr = self
            .accessors
            .get(kind)
            .call(&mut self.store, ())
            .map_err(|e| call_error(kind.export_name(), &e))?;
        usize::try_from(ptr)
            .map_err(|_| RunnerError::Memory(format!("{kind} pointer {ptr} is negative")))
    }

    /// Every region must lie inside linear memory.
    fn check_regions(&mut self) -> RunnerResult<()> {
        for kind in BufferKind::ALL {
            let ptr = self.pointer(kind)?;
            let size = self.memory.data(&self.store).len();
            if ptr.saturating_add(self.capacity) > size {
                return Err(RunnerError::Memory(format!(
                    "{kind} region at {ptr} with capacity {} exceeds memory of {size} bytes",
                    self.capacity
                )));
            }
        }
        Ok(())
    }
}

fn set_fuel(store: &mut Store<HostState>, fuel: u64) -> RunnerResult<()> {
    store
        .set_fuel(fuel)
        .map_err(|e| RunnerError::Config(e.to_string()))
}

fn call_error(function: &str, err: &wasmi::Error) -> RunnerError {
    if err.as_trap_code() == Some(TrapCode::OutOfFuel) {
        return RunnerError::FuelExhausted {
            function: function.to_string(),
        };
    }
    RunnerError::Trap {
        function: function.to_string(),
        message: err.to_string(),
    }
}
