//! Function bodies for generated guests.
//!
//! Every managed function has the shape `(input_len: i32) -> i32`: it reads
//! an Args frame from guest-input and returns the length of the frame it
//! left in guest-output.

use wasm_encoder::{BlockType, Function, Instruction, ValType};
use wasmy_codec::tags::*;
use wasmy_types::BufferKind;

use crate::layout::Layout;

// ══════════════════════════════════════════════════════════════════════════════
// Boilerplate
// ══════════════════════════════════════════════════════════════════════════════

/// `() -> i32` returning a fixed address or size.
pub fn emit_const_i32(value: u32) -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::I32Const(value as i32));
    f.instruction(&Instruction::End);
    f
}

// ══════════════════════════════════════════════════════════════════════════════
// Managed functions
// ══════════════════════════════════════════════════════════════════════════════

/// Copy a precomputed frame from the data region to guest-output.
pub fn emit_copy_frame(layout: &Layout, data_offset: u32, len: u32) -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::I32Const(layout.offset(BufferKind::GuestOutput) as i32));
    f.instruction(&Instruction::I32Const(data_offset as i32));
    f.instruction(&Instruction::I32Const(len as i32));
    f.instruction(&Instruction::MemoryCopy {
        src_mem: 0,
        dst_mem: 0,
    });
    f.instruction(&Instruction::I32Const(len as i32));
    f.instruction(&Instruction::End);
    f
}

/// Return the first argument as the payload data, with no metadata.
///
/// Walks the encoded value in place to find its extent, then copies it
/// verbatim. An empty argument list yields nil. Input is trusted to be a
/// well-formed Args frame; unknown tags trap.
pub fn emit_echo(layout: &Layout) -> Function {
    // locals: 0 input_len (param), 1 pos, 2 remaining, 3 tag, 4 span
    let mut f = Function::new(vec![(4, ValType::I32)]);
    let input = layout.offset(BufferKind::GuestInput);
    let output = layout.offset(BufferKind::GuestOutput);
    let first = (input + ARGS_HEADER_SIZE as u32) as i32;

    // ── No arguments → nil payload ──
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32Const(ARGS_HEADER_SIZE as i32));
    f.instruction(&Instruction::I32LeS);
    f.instruction(&Instruction::If(BlockType::Empty));
    store_byte(&mut f, output, 0, FRAME_PAYLOAD);
    store_byte(&mut f, output, 1, TAG_NIL);
    f.instruction(&Instruction::I32Const(output as i32));
    f.instruction(&Instruction::I32Const(0));
    f.instruction(&Instruction::I32Store(memarg(2, 0)));
    f.instruction(&Instruction::I32Const(6));
    f.instruction(&Instruction::Return);
    f.instruction(&Instruction::End);

    // pos = first value; remaining = 1
    f.instruction(&Instruction::I32Const(first));
    f.instruction(&Instruction::LocalSet(1));
    f.instruction(&Instruction::I32Const(1));
    f.instruction(&Instruction::LocalSet(2));

    // ── Scan one value ──
    f.instruction(&Instruction::Block(BlockType::Empty));
    f.instruction(&Instruction::Loop(BlockType::Empty));

    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::I32Eqz);
    f.instruction(&Instruction::BrIf(1));
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::I32Const(1));
    f.instruction(&Instruction::I32Sub);
    f.instruction(&Instruction::LocalSet(2));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Load8U(memarg(0, 0)));
    f.instruction(&Instruction::LocalSet(3));

    // string / bytes: tag + len + body
    tag_is_either(&mut f, TAG_STRING, TAG_BYTES);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Const(1 + LEN_SIZE as i32));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Load(memarg(1, 0)));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::LocalSet(1));
    f.instruction(&Instruction::Br(1));
    f.instruction(&Instruction::End);

    // list: count more values follow
    tag_is(&mut f, TAG_LIST);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Load(memarg(1, 0)));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::LocalSet(2));
    advance(&mut f, 1 + LEN_SIZE as i32);
    f.instruction(&Instruction::Br(1));
    f.instruction(&Instruction::End);

    // map: a key and a value per entry
    tag_is(&mut f, TAG_MAP);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::LocalGet(2));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Load(memarg(1, 0)));
    f.instruction(&Instruction::I32Const(1));
    f.instruction(&Instruction::I32Shl);
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::LocalSet(2));
    advance(&mut f, 1 + LEN_SIZE as i32);
    f.instruction(&Instruction::Br(1));
    f.instruction(&Instruction::End);

    // int / float: tag + 8
    tag_is_either(&mut f, TAG_INT, TAG_FLOAT);
    f.instruction(&Instruction::If(BlockType::Empty));
    advance(&mut f, 9);
    f.instruction(&Instruction::Br(1));
    f.instruction(&Instruction::End);

    // bool: tag + 1
    tag_is(&mut f, TAG_BOOL);
    f.instruction(&Instruction::If(BlockType::Empty));
    advance(&mut f, 2);
    f.instruction(&Instruction::Br(1));
    f.instruction(&Instruction::End);

    // nil, or trap
    f.instruction(&Instruction::LocalGet(3));
    f.instruction(&Instruction::I32Const(TAG_NIL as i32));
    f.instruction(&Instruction::I32Ne);
    f.instruction(&Instruction::If(BlockType::Empty));
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
    advance(&mut f, 1);
    f.instruction(&Instruction::Br(0));

    f.instruction(&Instruction::End); // loop
    f.instruction(&Instruction::End); // block

    // span = pos - first
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Const(first));
    f.instruction(&Instruction::I32Sub);
    f.instruction(&Instruction::LocalSet(4));

    // ── Write the payload frame ──
    store_byte(&mut f, output, 0, FRAME_PAYLOAD);
    f.instruction(&Instruction::I32Const(output as i32 + 1));
    f.instruction(&Instruction::I32Const(first));
    f.instruction(&Instruction::LocalGet(4));
    f.instruction(&Instruction::MemoryCopy {
        src_mem: 0,
        dst_mem: 0,
    });
    // empty meta map
    f.instruction(&Instruction::LocalGet(4));
    f.instruction(&Instruction::I32Const(0));
    f.instruction(&Instruction::I32Store(memarg(u64::from(output) + 1, 0)));

    f.instruction(&Instruction::LocalGet(4));
    f.instruction(&Instruction::I32Const(1 + LEN_SIZE as i32));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::End);
    f
}

/// Forward guest-input to a host import and its reply back to guest-output.
pub fn emit_relay(layout: &Layout, import_idx: u32) -> Function {
    // locals: 0 input_len (param), 1 reply_len
    let mut f = Function::new(vec![(1, ValType::I32)]);

    f.instruction(&Instruction::I32Const(layout.offset(BufferKind::HostInput) as i32));
    f.instruction(&Instruction::I32Const(layout.offset(BufferKind::GuestInput) as i32));
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::MemoryCopy {
        src_mem: 0,
        dst_mem: 0,
    });

    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::Call(import_idx));
    f.instruction(&Instruction::LocalSet(1));

    f.instruction(&Instruction::I32Const(layout.offset(BufferKind::GuestOutput) as i32));
    f.instruction(&Instruction::I32Const(layout.offset(BufferKind::HostOutput) as i32));
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::MemoryCopy {
        src_mem: 0,
        dst_mem: 0,
    });

    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::End);
    f
}

/// Loop forever.
pub fn emit_spin() -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::Loop(BlockType::Empty));
    f.instruction(&Instruction::Br(0));
    f.instruction(&Instruction::End);
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
    f
}

/// Trap immediately.
pub fn emit_trap() -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::Unreachable);
    f.instruction(&Instruction::End);
    f
}

/// Return `len` without touching guest-output.
pub fn emit_raw_length(len: i32) -> Function {
    let mut f = Function::new(vec![]);
    f.instruction(&Instruction::I32Const(len));
    f.instruction(&Instruction::End);
    f
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn store_byte(f: &mut Function, base: u32, offset: u64, byte: u8) {
    f.instruction(&Instruction::I32Const(base as i32));
    f.instruction(&Instruction::I32Const(i32::from(byte)));
    f.instruction(&Instruction::I32Store8(memarg(offset, 0)));
}

fn tag_is(f: &mut Function, tag: u8) {
    f.instruction(&Instruction::LocalGet(3));
    f.instruction(&Instruction::I32Const(i32::from(tag)));
    f.instruction(&Instruction::I32Eq);
}

fn tag_is_either(f: &mut Function, a: u8, b: u8) {
    tag_is(f, a);
    tag_is(f, b);
    f.instruction(&Instruction::I32Or);
}

fn advance(f: &mut Function, by: i32) {
    f.instruction(&Instruction::LocalGet(1));
    f.instruction(&Instruction::I32Const(by));
    f.instruction(&Instruction::I32Add);
    f.instruction(&Instruction::LocalSet(1));
}

fn memarg(offset: u64, align: u32) -> wasm_encoder::MemArg {
    wasm_encoder::MemArg {
        offset,
        align,
        memory_index: 0,
    }
}
