//! Instruction decoding front end for the Cell Broadband Engine.
//!
//! Turns raw big-endian PPU and SPU machine code into [`InstrIR`] nodes grouped into
//! [`BasicBlock`]s. Every word decodes: encodings outside the supported subset become
//! `OpKind::Unknown` nodes carrying the raw word.

pub mod block;
pub mod context;
pub mod decoder;
pub mod ir;
pub mod module;
pub mod ppu;
pub mod spu;

pub use block::{BasicBlock, BlockAssembler, Terminator};
pub use context::{Arch, DecodeConfig, DecodeContext, UnknownPolicy};
pub use decoder::{decode_block, Decoder, Isa};
pub use ir::{Effects, Flag, Imm, InstrIR, OpKind, Operand, Reg};
pub use module::CellModule;
