//! Synergistic Processor Unit.

pub mod forms;
pub mod instructions;

use crate::context::Arch;
use crate::decoder::Isa;
use crate::ir::InstrIR;

/// SPU decoding strategy. Addresses are local store offsets.
#[derive(Debug, Copy, Clone, Default)]
pub struct Spu;

impl Isa for Spu {
    const ARCH: Arch = Arch::Spu;

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
