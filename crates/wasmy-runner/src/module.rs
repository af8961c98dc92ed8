//! Compiled guest modules.

use std::fmt;
use std::path::Path;

use wasmi::{Config, Engine, ExternType, Module};

use crate::error::{RunnerError, RunnerResult};

/// Engine settings a module is compiled with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Count instructions so runners can bound each call with fuel.
    pub fuel_metering: bool,
}

/// A compiled guest module.
///
/// Compile once and hand clones to as many runners as needed; every runner
/// instantiates it into its own store and linear memory.
#[derive(Clone)]
pub struct GuestModule {
    engine: Engine,
    module: Module,
    options: EngineOptions,
}

/// One entry of a module's import section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub module: String,
    pub name: String,
    pub is_function: bool,
}

impl GuestModule {
    pub fn compile(wasm: &[u8]) -> RunnerResult<Self> {
        Self::compile_with(wasm, EngineOptions::default())
    }

    pub fn compile_with(wasm: &[u8], options: EngineOptions) -> RunnerResult<Self> {
        let mut config = Config::default();
        config.consume_fuel(options.fuel_metering);
        let engine = Engine::new(&config);
        let module = Module::new(&engine, wasm).map_err(|e| RunnerError::Compile(e.to_string()))?;
        tracing::debug!(
            target: "wasmy::module",
            bytes = wasm.len(),
            fuel_metering = options.fuel_metering,
            "compiled guest module"
        );
        Ok(Self {
            engine,
            module,
            options,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> RunnerResult<Self> {
        Self::from_file_with(path, EngineOptions::default())
    }

    pub fn from_file_with(path: impl AsRef<Path>, options: EngineOptions) -> RunnerResult<Self> {
        let wasm = std::fs::read(path)?;
        Self::compile_with(&wasm, options)
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn imports(&self) -> Vec<ImportDecl> {
        self.module
            .imports()
            .map(|import| ImportDecl {
                module: import.module().to_string(),
                name: import.name().to_string(),
                is_function: matches!(import.ty(), ExternType::Func(_)),
            })
            .collect()
    }

    /// Names of every export, in declaration order.
    pub fn exports(&self) -> Vec<String> {
        self.module
            .exports()
            .map(|export| export.name().to_string())
            .collect()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn module(&self) -> &Module {
        &self.module
    }
}

impl fmt::Debug for GuestModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestModule")
            .field("options", &self.options)
            .field("exports", &self.exports())
            .finish()
    }
}
