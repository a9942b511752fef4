use crate::ir::Effects;
use crate::ir::OpKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    /// PowerPC Processor Unit: 64-bit PowerPC with VMX.
    Ppu,
    /// Synergistic Processor Unit, addressing its 256KiB local store.
    Spu,
}

impl Arch {
    pub fn name(self) -> &'static str {
        match self {
            Arch::Ppu => "ppu",
            Arch::Spu => "spu",
        }
    }

    /// Mask applied to computed branch targets. SPU addresses wrap within local store.
    pub fn address_mask(self) -> u64 {
        match self {
            Arch::Ppu => u64::MAX,
            Arch::Spu => SPU_LS_SIZE - 1,
        }
    }
}

pub const SPU_LS_SIZE: u64 = 0x4_0000;

/// Selects the instruction set and places the decoded buffer in the guest address space.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeContext {
    pub arch: Arch,
    /// Guest address of the first byte of the code buffer.
    pub base: u64,
}

impl DecodeContext {
    pub fn new(arch: Arch, base: u64) -> Self {
        Self { arch, base }
    }

    pub fn ppu(base: u64) -> Self {
        Self::new(Arch::Ppu, base)
    }

    pub fn spu(base: u64) -> Self {
        Self::new(Arch::Spu, base)
    }
}

/// What the block assembler does with an `OpKind::Unknown` instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// End the block on the unknown instruction (`Terminator::Unknown`).
    #[default]
    Terminate,
    /// Keep accumulating, treating the unknown word as straight-line code.
    Continue,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Block size cap in instructions. Zero behaves as one.
    pub max_instructions: usize,
    pub unknown_policy: UnknownPolicy,
}

impl DecodeConfig {
    pub const DEFAULT_MAX_INSTRUCTIONS: usize = 256;

    pub fn with_max_instructions(mut self, max: usize) -> Self {
        self.max_instructions = max;
        self
    }

    pub fn with_unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_instructions: Self::DEFAULT_MAX_INSTRUCTIONS,
            unknown_policy: UnknownPolicy::default(),
        }
    }
}

/// Raw opcode fields of one instruction word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fields {
    pub word: u32,
    pub primary: u16,
    /// Secondary opcode, for primary opcodes which select a group table.
    pub extended: Option<u16>,
}

/// Result of classification: what the instruction is and how to decode its operands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Classified<F> {
    pub name: &'static str,
    pub kind: OpKind,
    pub form: F,
    /// Effects implied by the opcode itself (`andi.`, `addic`, load with update...).
    pub effects: Effects,
}
