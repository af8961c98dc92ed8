//! Guest module assembler.
//!
//! Lays out the four managed buffers, emits the boilerplate exports and one
//! `(i32) -> i32` function per registered behaviour, then validates the
//! result with `wasmparser`.

use std::collections::BTreeSet;

use wasm_encoder::{
    CodeSection, ConstExpr, CustomSection, DataSection, EntityType, ExportKind, ExportSection,
    Function, FunctionSection, ImportSection, MemorySection, MemoryType, Module, TypeSection,
    ValType,
};
use wasmy_codec::{encode_error, encode_payload};
use wasmy_types::protocol::{
    DEFAULT_IMPORT_MODULE, DEFAULT_IMPORT_PREFIX, EXPORT_BUFFER_CAPACITY, EXPORT_MEMORY,
};
use wasmy_types::{BufferKind, Payload, BUFFER_SIZE};

use crate::body;
use crate::error::{GuestGenError, GuestGenResult};
use crate::layout::*;

/// Behaviour of one generated managed function.
#[derive(Debug, Clone, PartialEq)]
pub enum GuestFunction {
    /// Return the first argument (nil when there is none).
    Echo,
    /// Return a fixed payload.
    Constant(Payload),
    /// Report a fixed error message.
    Fail(String),
    /// Pass the arguments to the named host function and return its reply.
    Relay(String),
    /// Never return.
    Spin,
    /// Trap immediately.
    Trap,
    /// Return the given length without writing guest-output.
    RawLength(i32),
}

/// Builds a guest module that follows the managed buffer contract.
///
/// ```ignore
/// let wasm = GuestModuleBuilder::new()
///     .echo("hello")
///     .relay("greet", "PrintHello")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct GuestModuleBuilder {
    capacity: usize,
    import_module: String,
    import_prefix: String,
    functions: Vec<(String, GuestFunction)>,
    imports: Vec<String>,
    omitted: BTreeSet<String>,
    advertise_capacity: bool,
}

impl Default for GuestModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestModuleBuilder {
    pub fn new() -> Self {
        Self {
            capacity: BUFFER_SIZE,
            import_module: DEFAULT_IMPORT_MODULE.to_string(),
            import_prefix: DEFAULT_IMPORT_PREFIX.to_string(),
            functions: Vec::new(),
            imports: Vec::new(),
            omitted: BTreeSet::new(),
            advertise_capacity: true,
        }
    }

    // ── Configuration ────────────────────────────────────────────────────

    /// Size of each buffer region; also what `bufferCapacity` reports.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Import module and field prefix used for host functions.
    pub fn import_namespace(mut self, module: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.import_module = module.into();
        self.import_prefix = prefix.into();
        self
    }

    /// Do not export `name` (a boilerplate export or a function).
    pub fn omit_export(mut self, name: impl Into<String>) -> Self {
        self.omitted.insert(name.into());
        self
    }

    /// Do not emit the optional `bufferCapacity` export.
    pub fn without_capacity_export(mut self) -> Self {
        self.advertise_capacity = false;
        self
    }

    /// Declare a host import without a function that calls it.
    pub fn import(mut self, host_function: impl Into<String>) -> Self {
        self.add_import(host_function.into());
        self
    }

    // ── Functions ────────────────────────────────────────────────────────

    pub fn function(mut self, name: impl Into<String>, kind: GuestFunction) -> Self {
        if let GuestFunction::Relay(import) = &kind {
            self.add_import(import.clone());
        }
        self.functions.push((name.into(), kind));
        self
    }

    pub fn echo(self, name: impl Into<String>) -> Self {
        self.function(name, GuestFunction::Echo)
    }

    pub fn constant(self, name: impl Into<String>, payload: Payload) -> Self {
        self.function(name, GuestFunction::Constant(payload))
    }

    pub fn fail(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.function(name, GuestFunction::Fail(message.into()))
    }

    pub fn relay(self, name: impl Into<String>, host_function: impl Into<String>) -> Self {
        self.function(name, GuestFunction::Relay(host_function.into()))
    }

    pub fn spin(self, name: impl Into<String>) -> Self {
        self.function(name, GuestFunction::Spin)
    }

    pub fn trap(self, name: impl Into<String>) -> Self {
        self.function(name, GuestFunction::Trap)
    }

    pub fn raw_length(self, name: impl Into<String>, len: i32) -> Self {
        self.function(name, GuestFunction::RawLength(len))
    }

    fn add_import(&mut self, name: String) {
        if !self.imports.contains(&name) {
            self.imports.push(name);
        }
    }

    // ── Assembly ─────────────────────────────────────────────────────────

    /// Emit and validate the module.
    pub fn build(&self) -> GuestGenResult<Vec<u8>> {
        let capacity = u32::try_from(self.capacity).map_err(|_| {
            GuestGenError::LimitExceeded(format!("buffer capacity {}", self.capacity))
        })?;
        let layout = Layout::new(capacity);
        let data = self.collect_data(&layout)?;

        let mut module = Module::new();
        module.section(&emit_types());
        module.section(&self.emit_imports());
        let (funcs, code) = self.emit_functions(&layout, &data)?;
        module.section(&funcs);
        module.section(&self.emit_memory(&layout, data.bytes.len())?);
        module.section(&self.emit_exports()?);
        module.section(&code);
        module.section(&emit_data(&layout, data.bytes));
        module.section(&emit_custom());

        let wasm_bytes = module.finish();
        wasmparser::validate(&wasm_bytes)
            .map_err(|e| GuestGenError::ValidationFailed(format!("{e}")))?;
        Ok(wasm_bytes)
    }

    /// Encode constant frames into the data region, one per function.
    fn collect_data(&self, layout: &Layout) -> GuestGenResult<DataRegion> {
        let mut region = DataRegion::default();
        for (name, kind) in &self.functions {
            let frame = match kind {
                GuestFunction::Constant(payload) => {
                    encode_payload(payload).map_err(|source| GuestGenError::Codec {
                        function: name.clone(),
                        source,
                    })?
                }
                GuestFunction::Fail(message) => encode_error(message),
                _ => {
                    region.frames.push(None);
                    continue;
                }
            };
            if frame.len() > self.capacity {
                return Err(GuestGenError::FrameTooLarge {
                    function: name.clone(),
                    len: frame.len(),
                    capacity: self.capacity,
                });
            }
            let offset = layout.data_start() + region.bytes.len() as u32;
            region.frames.push(Some((offset, frame.len() as u32)));
            region.bytes.extend_from_slice(&frame);
        }
        Ok(region)
    }

    fn emit_imports(&self) -> ImportSection {
        let mut imports = ImportSection::new();
        for name in &self.imports {
            let field = format!("{}{}", self.import_prefix, name);
            imports.import(&self.import_module, &field, EntityType::Function(TYPE_I32_I32));
        }
        imports
    }

    fn emit_functions(
        &self,
        layout: &Layout,
        data: &DataRegion,
    ) -> GuestGenResult<(FunctionSection, CodeSection)> {
        let mut funcs = FunctionSection::new();
        let mut code = CodeSection::new();

        let mut push = |type_idx: u32, body: Function| {
            funcs.function(type_idx);
            code.function(&body);
        };

        for kind in BufferKind::ALL {
            push(TYPE_VOID_I32, body::emit_const_i32(layout.offset(kind)));
        }
        push(TYPE_VOID_I32, body::emit_const_i32(layout.capacity));

        for ((name, kind), frame) in self.functions.iter().zip(&data.frames) {
            let body = match (kind, frame) {
                (GuestFunction::Constant(_) | GuestFunction::Fail(_), Some((offset, len))) => {
                    body::emit_copy_frame(layout, *offset, *len)
                }
                (GuestFunction::Echo, _) => body::emit_echo(layout),
                (GuestFunction::Relay(import), _) => {
                    let idx = self.import_index(import).ok_or_else(|| {
                        GuestGenError::LimitExceeded(format!("{name}: undeclared import {import}"))
                    })?;
                    body::emit_relay(layout, idx)
                }
                (GuestFunction::Spin, _) => body::emit_spin(),
                (GuestFunction::Trap, _) => body::emit_trap(),
                (GuestFunction::RawLength(len), _) => body::emit_raw_length(*len),
                (GuestFunction::Constant(_) | GuestFunction::Fail(_), None) => {
                    return Err(GuestGenError::LimitExceeded(format!(
                        "{name}: constant frame missing"
                    )))
                }
            };
            push(TYPE_I32_I32, body);
        }

        Ok((funcs, code))
    }

    fn emit_memory(&self, layout: &Layout, data_len: usize) -> GuestGenResult<MemorySection> {
        let end = u64::from(layout.data_start()) + data_len as u64;
        if end > u64::from(u32::MAX) {
            return Err(GuestGenError::LimitExceeded(format!(
                "module needs {end} bytes of linear memory"
            )));
        }
        let pages = end.div_ceil(PAGE_SIZE).max(1);

        let mut memory = MemorySection::new();
        memory.memory(MemoryType {
            minimum: pages,
            maximum: Some(pages),
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        Ok(memory)
    }

    fn emit_exports(&self) -> GuestGenResult<ExportSection> {
        let mut exports = ExportSection::new();
        let mut seen = BTreeSet::new();
        let mut export = |name: &str, kind: ExportKind, idx: u32| -> GuestGenResult<()> {
            if !seen.insert(name.to_string()) {
                return Err(GuestGenError::DuplicateExport(name.to_string()));
            }
            if !self.omitted.contains(name) {
                exports.export(name, kind, idx);
            }
            Ok(())
        };

        let base = self.imports.len() as u32;
        export(EXPORT_MEMORY, ExportKind::Memory, 0)?;
        for (i, kind) in BufferKind::ALL.iter().enumerate() {
            export(kind.export_name(), ExportKind::Func, base + i as u32)?;
        }
        if self.advertise_capacity {
            export(EXPORT_BUFFER_CAPACITY, ExportKind::Func, base + BOILERPLATE_FUNC_COUNT - 1)?;
        }
        for (i, (name, _)) in self.functions.iter().enumerate() {
            export(name, ExportKind::Func, base + BOILERPLATE_FUNC_COUNT + i as u32)?;
        }
        Ok(exports)
    }

    fn import_index(&self, host_function: &str) -> Option<u32> {
        self.imports
            .iter()
            .position(|name| name == host_function)
            .map(|i| i as u32)
    }
}

// ── Sections without builder state ───────────────────────────────────────────

fn emit_types() -> TypeSection {
    let mut types = TypeSection::new();
    // TYPE_VOID_I32: () -> i32
    types.ty().function(vec![], vec![ValType::I32]);
    // TYPE_I32_I32: (i32) -> i32
    types.ty().function(vec![ValType::I32], vec![ValType::I32]);
    types
}

fn emit_data(layout: &Layout, bytes: Vec<u8>) -> DataSection {
    let mut data_sec = DataSection::new();
    if !bytes.is_empty() {
        data_sec.active(0, &ConstExpr::i32_const(layout.data_start() as i32), bytes);
    }
    data_sec
}

fn emit_custom() -> CustomSection<'static> {
    CustomSection {
        name: std::borrow::Cow::Borrowed(CUSTOM_SECTION_NAME),
        data: std::borrow::Cow::Borrowed(GENERATOR_VERSION.as_bytes()),
    }
}

/// Constant frames and where each function's frame lives.
#[derive(Default)]
struct DataRegion {
    bytes: Vec<u8>,
    /// Parallel to the builder's functions.
    frames: Vec<Option<(u32, u32)>>,
}
