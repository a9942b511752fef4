use std::fmt;

use smallvec::SmallVec;

use crate::context::{Arch, DecodeConfig, UnknownPolicy};
use crate::ir::{Effects, InstrIR, OpKind, INSTRUCTION_BYTES};

/// Why a basic block ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Terminator {
    Branch,
    ConditionalBranch,
    Return,
    Trap,
    SystemCall,
    /// An unknown instruction under `UnknownPolicy::Terminate`.
    Unknown,
    /// `max_instructions` was reached. Control falls through to `BasicBlock::end`.
    SizeLimit,
    /// The code buffer ran out. Control falls through to `BasicBlock::end`.
    EndOfInput,
}

impl Terminator {
    /// Terminator implied by a single instruction, if it ends the block.
    pub fn for_kind(kind: OpKind, policy: UnknownPolicy) -> Option<Terminator> {
        match kind {
            OpKind::Branch => Some(Terminator::Branch),
            OpKind::BranchConditional => Some(Terminator::ConditionalBranch),
            OpKind::Return => Some(Terminator::Return),
            OpKind::Trap => Some(Terminator::Trap),
            OpKind::SystemCall => Some(Terminator::SystemCall),
            OpKind::Unknown { .. } if policy == UnknownPolicy::Terminate => Some(Terminator::Unknown),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Terminator::Branch => "branch",
            Terminator::ConditionalBranch => "conditional branch",
            Terminator::Return => "return",
            Terminator::Trap => "trap",
            Terminator::SystemCall => "syscall",
            Terminator::Unknown => "unknown",
            Terminator::SizeLimit => "size limit",
            Terminator::EndOfInput => "end of input",
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A maximal run of instructions entered at `start` and left only through its last instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    arch: Arch,
    start: u64,
    instrs: Vec<InstrIR>,
    terminator: Terminator,
}

impl BasicBlock {
    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// Address one past the last instruction.
    pub fn end(&self) -> u64 {
        self.start.wrapping_add(self.byte_len())
    }

    pub fn byte_len(&self) -> u64 {
        self.instrs.len() as u64 * INSTRUCTION_BYTES
    }

    pub fn instrs(&self) -> &[InstrIR] {
        &self.instrs
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Blocks are never empty, this exists for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    pub fn last(&self) -> &InstrIR {
        // Construction guarantees at least one instruction
        &self.instrs[self.instrs.len() - 1]
    }

    /// Direct target of the final branch, wrapped to the architecture's address space.
    pub fn branch_target(&self) -> Option<u64> {
        self.last().branch_target().map(|target| target & self.arch.address_mask())
    }

    /// Address execution may continue at after the last instruction.
    pub fn fallthrough(&self) -> Option<u64> {
        let falls = match self.terminator {
            Terminator::ConditionalBranch
            | Terminator::SystemCall
            | Terminator::SizeLimit
            | Terminator::EndOfInput => true,
            // calls come back
            Terminator::Branch => self.last().effects().contains(Effects::LINK),
            Terminator::Trap => self.last().effects().contains(Effects::CONDITIONAL),
            Terminator::Return | Terminator::Unknown => false,
        };
        falls.then(|| self.end() & self.arch.address_mask())
    }

    /// Statically known successor addresses: branch target first, then fallthrough.
    pub fn successors(&self) -> SmallVec<[u64; 2]> {
        let mut successors = SmallVec::new();
        successors.extend(self.branch_target());
        if let Some(next) = self.fallthrough() {
            if !successors.contains(&next) {
                successors.push(next);
            }
        }
        successors
    }

    pub fn into_instrs(self) -> Vec<InstrIR> {
        self.instrs
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} block {:#x}..{:#x} ({})", self.arch.name(), self.start, self.end(), self.terminator)?;
        for ir in &self.instrs {
            writeln!(f, "  {:08x}: {:08x}  {}", ir.address(), ir.raw(), ir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Accumulating,
    Terminated(Terminator),
}

/// Builds one `BasicBlock` from decoded instructions, in address order.
#[derive(Debug)]
pub struct BlockAssembler {
    arch: Arch,
    start: u64,
    cursor: u64,
    max_instructions: usize,
    unknown_policy: UnknownPolicy,
    instrs: Vec<InstrIR>,
    state: State,
}

impl BlockAssembler {
    pub fn new(arch: Arch, start: u64, config: DecodeConfig) -> Self {
        let max_instructions = config.max_instructions.max(1);
        Self {
            arch,
            start,
            cursor: start,
            max_instructions,
            unknown_policy: config.unknown_policy,
            instrs: Vec::with_capacity(max_instructions.min(64)),
            state: State::Accumulating,
        }
    }

    /// Address the next instruction is expected at.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Appends the next instruction. Once the block has terminated the instruction is handed
    /// back untouched.
    pub fn push(&mut self, ir: InstrIR) -> Result<State, InstrIR> {
        if let State::Terminated(_) = self.state {
            return Err(ir);
        }

        let ends = Terminator::for_kind(ir.kind(), self.unknown_policy);
        self.instrs.push(ir);
        self.cursor = self.cursor.wrapping_add(INSTRUCTION_BYTES);

        if let Some(terminator) = ends {
            self.state = State::Terminated(terminator);
        } else if self.instrs.len() >= self.max_instructions {
            self.state = State::Terminated(Terminator::SizeLimit);
        }
        Ok(self.state)
    }

    /// Closes the block. A block still accumulating ran out of input.
    /// Returns `None` if nothing was pushed.
    pub fn finish(self) -> Option<BasicBlock> {
        if self.instrs.is_empty() {
            return None;
        }
        let terminator = match self.state {
            State::Terminated(terminator) => terminator,
            State::Accumulating => Terminator::EndOfInput,
        };
        Some(BasicBlock { arch: self.arch, start: self.start, instrs: self.instrs, terminator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Imm, Operand, Operands};
    use smallvec::smallvec;

    fn nop(address: u64) -> InstrIR {
        InstrIR::new(OpKind::Nop, "nop", Operands::new(), Effects::empty(), address, 0x6000_0000)
    }

    fn branch(address: u64, displacement: u64, effects: Effects) -> InstrIR {
        InstrIR::new(OpKind::Branch, "b", smallvec![Operand::from(Imm::signed(displacement, 26))],
            effects, address, 0x4800_0000)
    }

    #[test]
    fn terminates_on_control_flow() {
        let mut asm = BlockAssembler::new(Arch::Ppu, 0x100, DecodeConfig::default());
        assert_eq!(asm.push(nop(0x100)), Ok(State::Accumulating));
        assert_eq!(asm.cursor(), 0x104);
        assert_eq!(asm.push(branch(0x104, 0x20, Effects::empty())), Ok(State::Terminated(Terminator::Branch)));

        // rejected and handed back
        let extra = nop(0x108);
        assert_eq!(asm.push(extra.clone()), Err(extra));

        let block = asm.finish().unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(block.end(), 0x108);
        assert_eq!(block.terminator(), Terminator::Branch);
        assert_eq!(block.branch_target(), Some(0x124));
        assert_eq!(block.fallthrough(), None);
        assert_eq!(&block.successors()[..], &[0x124]);
    }

    #[test]
    fn calls_fall_through() {
        let mut asm = BlockAssembler::new(Arch::Ppu, 0, DecodeConfig::default());
        asm.push(branch(0, 0x40, Effects::LINK)).unwrap();
        let block = asm.finish().unwrap();
        assert_eq!(&block.successors()[..], &[0x40, 0x4]);
    }

    #[test]
    fn size_limit() {
        let config = DecodeConfig::default().with_max_instructions(3);
        let mut asm = BlockAssembler::new(Arch::Ppu, 0, config);
        asm.push(nop(0)).unwrap();
        asm.push(nop(4)).unwrap();
        assert_eq!(asm.push(nop(8)), Ok(State::Terminated(Terminator::SizeLimit)));
        let block = asm.finish().unwrap();
        assert_eq!(block.fallthrough(), Some(block.end()));
        assert_eq!(block.end(), 12);
    }

    #[test]
    fn zero_cap_behaves_as_one() {
        let config = DecodeConfig::default().with_max_instructions(0);
        let mut asm = BlockAssembler::new(Arch::Spu, 0, config);
        assert_eq!(asm.push(nop(0)), Ok(State::Terminated(Terminator::SizeLimit)));
    }

    #[test]
    fn unknown_policy() {
        let mut asm = BlockAssembler::new(Arch::Ppu, 0, DecodeConfig::default());
        assert_eq!(asm.push(InstrIR::unknown(0, 0)), Ok(State::Terminated(Terminator::Unknown)));

        let config = DecodeConfig::default().with_unknown_policy(UnknownPolicy::Continue);
        let mut asm = BlockAssembler::new(Arch::Ppu, 0, config);
        assert_eq!(asm.push(InstrIR::unknown(0, 0)), Ok(State::Accumulating));
        let block = asm.finish().unwrap();
        assert_eq!(block.terminator(), Terminator::EndOfInput);
        assert_eq!(block.fallthrough(), Some(4));
    }

    #[test]
    fn empty_assembler_yields_nothing() {
        let asm = BlockAssembler::new(Arch::Ppu, 0, DecodeConfig::default());
        assert!(asm.is_empty());
        assert!(asm.finish().is_none());
    }

    #[test]
    fn spu_targets_wrap_in_local_store() {
        let mut asm = BlockAssembler::new(Arch::Spu, 0x3fffc, DecodeConfig::default());
        asm.push(branch(0x3fffc, 0x8, Effects::empty())).unwrap();
        let block = asm.finish().unwrap();
        assert_eq!(block.branch_target(), Some(0x4));
    }
}
