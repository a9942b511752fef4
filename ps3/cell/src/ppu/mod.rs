//! PowerPC Processor Unit: 64-bit PowerPC with the VMX vector extension.

pub mod forms;
pub mod instructions;

use crate::context::Arch;
use crate::decoder::Isa;
use crate::ir::InstrIR;

/// PPU decoding strategy.
#[derive(Debug, Copy, Clone, Default)]
pub struct Ppu;

impl Isa for Ppu {
    const ARCH: Arch = Arch::Ppu;

    fn decode(word: u32, address: u64) -> InstrIR {
        let fields = instructions::fields(word);
        match instructions::classify(&fields) {
            Some(op) => {
                let (operands, effects) = instructions::decode_operands(op.form, word);
                InstrIR::new(op.kind, op.name, operands, op.effects | effects, address, word)
            }
            None => InstrIR::unknown(word, address),
        }
    }
}
