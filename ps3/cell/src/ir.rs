//! Architecture-neutral representation of one decoded instruction.
//!
//! Everything the execution engine needs is carried explicitly: operation category, typed
//! operands (registers, immediates with their width and signedness, condition flags) and
//! side effects. Nothing downstream has to look at the raw word again, it is only kept for
//! diagnostics.

use std::fmt;

use bitflags::bitflags;
use common::util::{low_mask, sign_extend};
use smallvec::SmallVec;

/// Both supported instruction sets are fixed width.
pub const INSTRUCTION_BYTES: u64 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpKind {
    Nop,
    Return,
    Branch,
    BranchConditional,
    Trap,
    SystemCall,
    IntegerArithmetic,
    IntegerLogical,
    ShiftRotate,
    Compare,
    Load,
    Store,
    FloatArithmetic,
    VectorArithmetic,
    VectorPermute,
    ConditionRegister,
    SpecialRegister,
    Sync,
    CacheControl,
    BranchHint,
    /// The word matched no known encoding. This is data, not an error.
    Unknown { raw: u32 },
}

impl OpKind {
    pub fn is_unknown(self) -> bool {
        matches!(self, OpKind::Unknown { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Reg {
    // PPU
    Gpr(u8),
    Fpr(u8),
    Vr(u8),
    Lr,
    Ctr,
    Xer,
    Spr(u16),

    // SPU
    Spu(u8),
    Channel(u8),
    SpuSpr(u8),
}

impl Reg {
    /// Maps a PPU SPR number, naming the registers branches and carries use.
    pub fn from_spr(spr: u16) -> Reg {
        match spr {
            1 => Reg::Xer,
            8 => Reg::Lr,
            9 => Reg::Ctr,
            n => Reg::Spr(n),
        }
    }
}

/// Immediate operand.
///
/// `value` is already extended to 64 bits (and scaled to bytes for displacements), `width`
/// is the number of significant bits of that value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Imm {
    value: i64,
    width: u8,
    signed: bool,
}

impl Imm {
    pub fn signed(field: u64, width: u32) -> Imm {
        Imm { value: sign_extend(field, width), width: width as u8, signed: true }
    }

    pub fn unsigned(field: u64, width: u32) -> Imm {
        Imm { value: (field & low_mask(width)) as i64, width: width as u8, signed: false }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The value truncated back to its field width.
    pub fn bits(&self) -> u64 {
        self.value as u64 & low_mask(self.width())
    }
}

/// Reference to condition state read or written by an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// One of the 32 condition register bits (BI, BA, BB, BT fields).
    CrBit(u8),
    /// One of the 8 condition register fields (BF fields).
    CrField(u8),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg(Reg),
    Imm(Imm),
    Flag(Flag),
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<Imm> for Operand {
    fn from(imm: Imm) -> Self {
        Operand::Imm(imm)
    }
}

impl From<Flag> for Operand {
    fn from(flag: Flag) -> Self {
        Operand::Flag(flag)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct Effects: u16 {
        /// Record form: CR0 reflects the integer result.
        const SETS_CR0 = 1 << 0;
        /// Record form: CR1 reflects the floating point exception summary.
        const SETS_CR1 = 1 << 1;
        /// Record form: CR6 reflects a vector compare.
        const SETS_CR6 = 1 << 2;
        /// OE set: XER[OV] and XER[SO] are updated.
        const SETS_OV = 1 << 3;
        /// XER[CA] is updated.
        const SETS_CA = 1 << 4;
        /// The return address is written to the link register.
        const LINK = 1 << 5;
        /// The target or address is absolute rather than relative to the instruction.
        const ABSOLUTE = 1 << 6;
        /// The effective address is written back to the base register.
        const UPDATE = 1 << 7;
        /// Only takes effect when its condition holds, otherwise execution falls through.
        /// Set on traps and halts which are not unconditional.
        const CONDITIONAL = 1 << 8;
    }
}

impl Effects {
    pub fn sets_condition(self) -> bool {
        self.intersects(Effects::SETS_CR0 | Effects::SETS_CR1 | Effects::SETS_CR6)
    }
}

pub type Operands = SmallVec<[Operand; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrIR {
    kind: OpKind,
    mnemonic: &'static str,
    operands: Operands,
    effects: Effects,
    address: u64,
    raw: u32,
}

impl InstrIR {
    pub fn new(
        kind: OpKind,
        mnemonic: &'static str,
        operands: Operands,
        effects: Effects,
        address: u64,
        raw: u32,
    ) -> InstrIR {
        InstrIR { kind, mnemonic, operands, effects, address, raw }
    }

    pub fn unknown(raw: u32, address: u64) -> InstrIR {
        InstrIR {
            kind: OpKind::Unknown { raw },
            mnemonic: ".long",
            operands: Operands::new(),
            effects: Effects::empty(),
            address,
            raw,
        }
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn effects(&self) -> Effects {
        self.effects
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Target of a direct branch.
    ///
    /// `None` for non-branches and for branches through a register (LR, CTR, SPU register).
    pub fn branch_target(&self) -> Option<u64> {
        if !matches!(self.kind, OpKind::Branch | OpKind::BranchConditional) {
            return None;
        }
        let displacement = match self.operands.last()? {
            Operand::Imm(imm) => imm.value(),
            _ => return None,
        };
        Some(if self.effects.contains(Effects::ABSOLUTE) {
            displacement as u64
        } else {
            self.address.wrapping_add(displacement as u64)
        })
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::Gpr(n) => write!(f, "r{}", n),
            Reg::Fpr(n) => write!(f, "f{}", n),
            Reg::Vr(n) => write!(f, "v{}", n),
            Reg::Lr => f.write_str("lr"),
            Reg::Ctr => f.write_str("ctr"),
            Reg::Xer => f.write_str("xer"),
            Reg::Spr(n) => write!(f, "spr{}", n),
            Reg::Spu(n) => write!(f, "${}", n),
            Reg::Channel(n) => write!(f, "$ch{}", n),
            Reg::SpuSpr(n) => write!(f, "$sp{}", n),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => fmt::Display::fmt(reg, f),
            Operand::Imm(imm) if imm.value() < 0 => write!(f, "-{:#x}", imm.value().unsigned_abs()),
            Operand::Imm(imm) => write!(f, "{:#x}", imm.value()),
            Operand::Flag(Flag::CrBit(bit)) => write!(f, "crb{}", bit),
            Operand::Flag(Flag::CrField(field)) => write!(f, "cr{}", field),
        }
    }
}

impl fmt::Display for InstrIR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let OpKind::Unknown { raw } = self.kind {
            return write!(f, "{:<10} {:#010x}", self.mnemonic, raw);
        }

        let mut name = self.mnemonic.to_owned();
        if self.effects.contains(Effects::SETS_OV) {
            name.push('o');
        }
        if self.effects.sets_condition() && !name.ends_with('.') {
            name.push('.');
        }

        let args = self.operands.iter().map(|op| op.to_string()).collect::<Vec<_>>();
        if args.is_empty() {
            f.write_str(&name)
        } else {
            write!(f, "{:<10} {}", name, args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn immediates_keep_width_and_sign() {
        let imm = Imm::signed(0xfffc, 16);
        assert_eq!(imm.value(), -4);
        assert_eq!(imm.width(), 16);
        assert!(imm.is_signed());
        assert_eq!(imm.bits(), 0xfffc);

        let imm = Imm::unsigned(0x1_8000, 16);
        assert_eq!(imm.value(), 0x8000);
        assert!(!imm.is_signed());
    }

    #[test]
    fn relative_and_absolute_targets() {
        let rel = InstrIR::new(OpKind::Branch, "b", smallvec![Operand::from(Imm::signed(0x3fffff8, 26))],
            Effects::empty(), 0x1000, 0x4bfffff8);
        assert_eq!(rel.branch_target(), Some(0xff8));

        let abs = InstrIR::new(OpKind::Branch, "b", smallvec![Operand::from(Imm::signed(0x100, 26))],
            Effects::ABSOLUTE, 0x1000, 0x48000102);
        assert_eq!(abs.branch_target(), Some(0x100));

        let ind = InstrIR::new(OpKind::Branch, "bcctr", smallvec![Operand::from(Reg::Ctr)],
            Effects::empty(), 0x1000, 0x4e800420);
        assert_eq!(ind.branch_target(), None);
    }

    #[test]
    fn display_adds_record_and_overflow_suffixes() {
        let ir = InstrIR::new(OpKind::IntegerArithmetic, "add",
            smallvec![Operand::from(Reg::Gpr(3)), Operand::from(Reg::Gpr(4)), Operand::from(Reg::Gpr(5))],
            Effects::SETS_CR0 | Effects::SETS_OV, 0, 0x7c642e15);
        assert_eq!(ir.to_string(), "addo.      r3, r4, r5");

        let ir = InstrIR::new(OpKind::IntegerLogical, "andi.",
            smallvec![Operand::from(Reg::Gpr(3)), Operand::from(Reg::Gpr(4)), Operand::from(Imm::unsigned(0xff, 16))],
            Effects::SETS_CR0, 0, 0x708300ff);
        assert_eq!(ir.to_string(), "andi.      r3, r4, 0xff");

        assert_eq!(InstrIR::unknown(0, 0).to_string(), ".long      0x00000000");
    }
}
