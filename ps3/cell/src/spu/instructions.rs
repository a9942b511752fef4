use smallvec::smallvec;

use super::forms::*;
use crate::context::{Classified, Fields};
use crate::ir::{Effects, Imm, OpKind, Operand, Operands, Reg};

/// Width of the opcode lookup key. Shorter opcodes are expanded over every key they prefix.
pub const OPCODE_BITS: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    NoOperands,
    Stop,

    Rr,
    RrUnary,
    Rrr,
    Ri7,
    Ri8,
    Ri10,
    Ri10Mem,
    Ri16(bool), // true == signed
    Ri16Mem,
    Ri18,

    Branch,
    BranchLink,
    BranchCond,
    BranchIndirect,
    BranchIndirectLink,
    BranchIndirectCond,
    Halt,
    HaltImm,

    ReadChannel,
    WriteChannel,
    MoveFromSpr,
    MoveToSpr,

    HintReg,
    HintImm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionInfo {
    Reserved,
    Op(&'static str, OpKind, Form, Effects),
}

/// SPU words have no secondary opcode; the top 11 bits select the table entry directly.
pub fn fields(word: u32) -> Fields {
    Fields { word, primary: (word >> (32 - OPCODE_BITS)) as u16, extended: None }
}

pub fn classify(fields: &Fields) -> Option<Classified<Form>> {
    let InstructionInfo::Op(name, kind, form, effects) = OPCODE_TABLE[fields.primary as usize] else {
        return None;
    };
    let mut classified = Classified { name, kind, form, effects };

    // `bi $0` returns through the link register
    if form == Form::BranchIndirect && Rr::from(fields.word).ra() == 0 {
        classified.kind = OpKind::Return;
        classified.form = Form::NoOperands;
    }
    Some(classified)
}

#[inline(always)]
fn reg(n: u8) -> Operand {
    Reg::Spu(n).into()
}

#[inline(always)]
fn simm(field: impl Into<u64>, width: u32) -> Operand {
    Imm::signed(field.into(), width).into()
}

#[inline(always)]
fn uimm(field: impl Into<u64>, width: u32) -> Operand {
    Imm::unsigned(field.into(), width).into()
}

/// Word displacement of a branch, load or store, scaled to bytes.
#[inline(always)]
fn displacement(field: u16) -> Operand {
    simm((field as u32) << 2, 18)
}

/// Extracts the operands of `word` according to `form`. Displacements are scaled to bytes;
/// local store offsets are scaled from quadwords.
pub fn decode_operands(form: Form, word: u32) -> (Operands, Effects) {
    use Form::*;

    let operands: Operands = match form {
        NoOperands => Operands::new(),
        Stop => smallvec![uimm(stop_signal(word), 14)],

        Rr | BranchIndirectLink | BranchIndirectCond => {
            let rr = self::Rr::from(word);
            if form == Rr {
                smallvec![reg(rr.rt()), reg(rr.ra()), reg(rr.rb())]
            } else {
                smallvec![reg(rr.rt()), reg(rr.ra())]
            }
        }
        RrUnary => {
            let rr = self::Rr::from(word);
            smallvec![reg(rr.rt()), reg(rr.ra())]
        }
        Rrr => {
            let rrr = self::Rrr::from(word);
            smallvec![reg(rrr.rt()), reg(rrr.ra()), reg(rrr.rb()), reg(rrr.rc())]
        }
        Ri7 => {
            let ri = self::Ri7::from(word);
            smallvec![reg(ri.rt()), reg(ri.ra()), simm(ri.i7(), 7)]
        }
        Ri8 => {
            let ri = self::Ri8::from(word);
            smallvec![reg(ri.rt()), reg(ri.ra()), uimm(ri.i8(), 8)]
        }
        Ri10 => {
            let ri = self::Ri10::from(word);
            smallvec![reg(ri.rt()), reg(ri.ra()), simm(ri.i10(), 10)]
        }
        Ri10Mem => {
            let ri = self::Ri10::from(word);
            smallvec![reg(ri.rt()), simm((ri.i10() as u32) << 4, 14), reg(ri.ra())]
        }
        Ri16(signed) => {
            let ri = self::Ri16::from(word);
            let imm = if signed { simm(ri.i16(), 16) } else { uimm(ri.i16(), 16) };
            smallvec![reg(ri.rt()), imm]
        }
        Ri16Mem | BranchLink | BranchCond => {
            let ri = self::Ri16::from(word);
            smallvec![reg(ri.rt()), displacement(ri.i16())]
        }
        Ri18 => {
            let ri = self::Ri18::from(word);
            smallvec![reg(ri.rt()), uimm(ri.i18(), 18)]
        }
        Branch => smallvec![displacement(self::Ri16::from(word).i16())],
        BranchIndirect => smallvec![reg(self::Rr::from(word).ra())],
        Halt => {
            let rr = self::Rr::from(word);
            smallvec![reg(rr.ra()), reg(rr.rb())]
        }
        HaltImm => {
            let ri = self::Ri10::from(word);
            smallvec![reg(ri.ra()), simm(ri.i10(), 10)]
        }

        ReadChannel => {
            let rr = self::Rr::from(word);
            smallvec![reg(rr.rt()), Operand::Reg(Reg::Channel(rr.ra()))]
        }
        WriteChannel => {
            let rr = self::Rr::from(word);
            smallvec![Operand::Reg(Reg::Channel(rr.ra())), reg(rr.rt())]
        }
        MoveFromSpr => {
            let rr = self::Rr::from(word);
            smallvec![reg(rr.rt()), Operand::Reg(Reg::SpuSpr(rr.ra()))]
        }
        MoveToSpr => {
            let rr = self::Rr::from(word);
            smallvec![Operand::Reg(Reg::SpuSpr(rr.ra())), reg(rr.rt())]
        }

        HintReg => {
            let rr = self::Rr::from(word);
            smallvec![simm(hint_offset_rr(rr) << 2, 11), reg(rr.ra())]
        }
        HintImm => {
            let ri = self::Ri18::from(word);
            smallvec![simm(hint_offset_ri18(ri) << 2, 11), displacement(ri.i18() as u16)]
        }
    };

    // Every effect on the SPU is a property of the opcode.
    (operands, Effects::empty())
}

const NONE: Effects = Effects::empty();
const LINK: Effects = Effects::LINK;
const ABS: Effects = Effects::ABSOLUTE;
const COND: Effects = Effects::CONDITIONAL;

const fn build_opcode_table() -> [InstructionInfo; 2048] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let ops = [
        // RR and RI7, 11-bit opcodes
        (11, 0x000, Op("stop", Trap, Stop, NONE)),
        (11, 0x001, Op("lnop", Nop, NoOperands, NONE)),
        (11, 0x002, Op("sync", Sync, NoOperands, NONE)),
        (11, 0x003, Op("dsync", Sync, NoOperands, NONE)),
        (11, 0x00c, Op("mfspr", SpecialRegister, MoveFromSpr, NONE)),
        (11, 0x00d, Op("rdch", SpecialRegister, ReadChannel, NONE)),
        (11, 0x00f, Op("rchcnt", SpecialRegister, ReadChannel, NONE)),
        (11, 0x040, Op("sf", IntegerArithmetic, Form::Rr, NONE)),
        (11, 0x041, Op("or", IntegerLogical, Form::Rr, NONE)),
        (11, 0x048, Op("sfh", IntegerArithmetic, Form::Rr, NONE)),
        (11, 0x049, Op("nor", IntegerLogical, Form::Rr, NONE)),
        (11, 0x058, Op("rot", ShiftRotate, Form::Rr, NONE)),
        (11, 0x05b, Op("shl", ShiftRotate, Form::Rr, NONE)),
        (11, 0x078, Op("roti", ShiftRotate, Form::Ri7, NONE)),
        (11, 0x07b, Op("shli", ShiftRotate, Form::Ri7, NONE)),
        (11, 0x0c0, Op("a", IntegerArithmetic, Form::Rr, NONE)),
        (11, 0x0c1, Op("and", IntegerLogical, Form::Rr, NONE)),
        (11, 0x0c8, Op("ah", IntegerArithmetic, Form::Rr, NONE)),
        (11, 0x0c9, Op("nand", IntegerLogical, Form::Rr, NONE)),
        (11, 0x10c, Op("mtspr", SpecialRegister, MoveToSpr, NONE)),
        (11, 0x10d, Op("wrch", SpecialRegister, WriteChannel, NONE)),
        (11, 0x128, Op("biz", BranchConditional, BranchIndirectCond, NONE)),
        (11, 0x129, Op("binz", BranchConditional, BranchIndirectCond, NONE)),
        (11, 0x12a, Op("bihz", BranchConditional, BranchIndirectCond, NONE)),
        (11, 0x12b, Op("bihnz", BranchConditional, BranchIndirectCond, NONE)),
        (11, 0x140, Op("stopd", Trap, NoOperands, NONE)),
        (11, 0x144, Op("stqx", Store, Form::Rr, NONE)),
        (11, 0x1a8, Op("bi", OpKind::Branch, BranchIndirect, NONE)),
        (11, 0x1a9, Op("bisl", OpKind::Branch, BranchIndirectLink, LINK)),
        (11, 0x1aa, Op("iret", Return, NoOperands, NONE)),
        (11, 0x1ab, Op("bisled", BranchConditional, BranchIndirectLink, LINK)),
        (11, 0x1ac, Op("hbr", BranchHint, HintReg, NONE)),
        (11, 0x1b4, Op("fsm", VectorPermute, RrUnary, NONE)),
        (11, 0x1b8, Op("frest", FloatArithmetic, RrUnary, NONE)),
        (11, 0x1c4, Op("lqx", Load, Form::Rr, NONE)),
        (11, 0x1ff, Op("shlqbyi", ShiftRotate, Form::Ri7, NONE)),
        (11, 0x201, Op("nop", Nop, NoOperands, NONE)),
        (11, 0x240, Op("cgt", Compare, Form::Rr, NONE)),
        (11, 0x241, Op("xor", IntegerLogical, Form::Rr, NONE)),
        (11, 0x258, Op("hgt", Trap, Halt, COND)),
        (11, 0x2a5, Op("clz", IntegerArithmetic, RrUnary, NONE)),
        (11, 0x2b4, Op("cntb", IntegerArithmetic, RrUnary, NONE)),
        (11, 0x2b6, Op("xsbh", IntegerArithmetic, RrUnary, NONE)),
        (11, 0x2c0, Op("clgt", Compare, Form::Rr, NONE)),
        (11, 0x2c1, Op("andc", IntegerLogical, Form::Rr, NONE)),
        (11, 0x2c4, Op("fa", FloatArithmetic, Form::Rr, NONE)),
        (11, 0x2c5, Op("fs", FloatArithmetic, Form::Rr, NONE)),
        (11, 0x2c6, Op("fm", FloatArithmetic, Form::Rr, NONE)),
        (11, 0x2c9, Op("orc", IntegerLogical, Form::Rr, NONE)),
        (11, 0x2d8, Op("hlgt", Trap, Halt, COND)),
        (11, 0x3c0, Op("ceq", Compare, Form::Rr, NONE)),
        (11, 0x3c4, Op("mpy", IntegerArithmetic, Form::Rr, NONE)),
        (11, 0x3d8, Op("heq", Trap, Halt, COND)),
        // RI8
        (10, 0x1d8, Op("cflts", FloatArithmetic, Form::Ri8, NONE)),
        (10, 0x1d9, Op("cfltu", FloatArithmetic, Form::Ri8, NONE)),
        (10, 0x1da, Op("csflt", FloatArithmetic, Form::Ri8, NONE)),
        (10, 0x1db, Op("cuflt", FloatArithmetic, Form::Ri8, NONE)),
        // RI10
        (8, 0x04, Op("ori", IntegerLogical, Form::Ri10, NONE)),
        (8, 0x0c, Op("sfi", IntegerArithmetic, Form::Ri10, NONE)),
        (8, 0x14, Op("andi", IntegerLogical, Form::Ri10, NONE)),
        (8, 0x1c, Op("ai", IntegerArithmetic, Form::Ri10, NONE)),
        (8, 0x1d, Op("ahi", IntegerArithmetic, Form::Ri10, NONE)),
        (8, 0x24, Op("stqd", Store, Ri10Mem, NONE)),
        (8, 0x34, Op("lqd", Load, Ri10Mem, NONE)),
        (8, 0x44, Op("xori", IntegerLogical, Form::Ri10, NONE)),
        (8, 0x4c, Op("cgti", Compare, Form::Ri10, NONE)),
        (8, 0x4f, Op("hgti", Trap, HaltImm, COND)),
        (8, 0x5c, Op("clgti", Compare, Form::Ri10, NONE)),
        (8, 0x5f, Op("hlgti", Trap, HaltImm, COND)),
        (8, 0x74, Op("mpyi", IntegerArithmetic, Form::Ri10, NONE)),
        (8, 0x7c, Op("ceqi", Compare, Form::Ri10, NONE)),
        (8, 0x7f, Op("heqi", Trap, HaltImm, COND)),
        // RI16
        (9, 0x040, Op("brz", BranchConditional, BranchCond, NONE)),
        (9, 0x041, Op("stqa", Store, Ri16Mem, ABS)),
        (9, 0x042, Op("brnz", BranchConditional, BranchCond, NONE)),
        (9, 0x044, Op("brhz", BranchConditional, BranchCond, NONE)),
        (9, 0x046, Op("brhnz", BranchConditional, BranchCond, NONE)),
        (9, 0x047, Op("stqr", Store, Ri16Mem, NONE)),
        (9, 0x060, Op("bra", OpKind::Branch, Form::Branch, ABS)),
        (9, 0x061, Op("lqa", Load, Ri16Mem, ABS)),
        (9, 0x062, Op("brasl", OpKind::Branch, BranchLink, LINK.union(ABS))),
        (9, 0x064, Op("br", OpKind::Branch, Form::Branch, NONE)),
        (9, 0x065, Op("fsmbi", VectorPermute, Ri16(false), NONE)),
        (9, 0x066, Op("brsl", OpKind::Branch, BranchLink, LINK)),
        (9, 0x067, Op("lqr", Load, Ri16Mem, NONE)),
        (9, 0x081, Op("il", IntegerArithmetic, Ri16(true), NONE)),
        (9, 0x082, Op("ilhu", IntegerArithmetic, Ri16(false), NONE)),
        (9, 0x083, Op("ilh", IntegerArithmetic, Ri16(false), NONE)),
        (9, 0x0c1, Op("iohl", IntegerLogical, Ri16(false), NONE)),
        // RI18
        (7, 0x08, Op("hbra", BranchHint, HintImm, ABS)),
        (7, 0x09, Op("hbrr", BranchHint, HintImm, NONE)),
        (7, 0x21, Op("ila", IntegerArithmetic, Form::Ri18, NONE)),
        // RRR
        (4, 0x8, Op("selb", VectorPermute, Form::Rrr, NONE)),
        (4, 0xb, Op("shufb", VectorPermute, Form::Rrr, NONE)),
        (4, 0xc, Op("mpya", IntegerArithmetic, Form::Rrr, NONE)),
        (4, 0xd, Op("fnms", FloatArithmetic, Form::Rrr, NONE)),
        (4, 0xe, Op("fma", FloatArithmetic, Form::Rrr, NONE)),
        (4, 0xf, Op("fms", FloatArithmetic, Form::Rrr, NONE)),
    ];

    let mut table = [Reserved; 2048];
    let mut i = 0;
    while i < ops.len() {
        let (bits, opcode, info) = ops[i];
        let shift = OPCODE_BITS - bits;
        let first = opcode << shift;
        let mut key = first;
        while key < first + (1 << shift) {
            table[key] = info;
            key += 1;
        }
        i += 1;
    }
    table
}

static OPCODE_TABLE: [InstructionInfo; 2048] = build_opcode_table();

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(word: u32) -> (Classified<Form>, Operands) {
        let classified = classify(&fields(word)).expect("known instruction");
        let (operands, effects) = decode_operands(classified.form, word);
        assert!(effects.is_empty());
        (classified, operands)
    }

    #[test]
    fn opcode_widths_expand() {
        // ai with every possible low immediate bit pattern still lands on ai
        for low in 0..8u32 {
            let word = 0x1c00_0000 | low << 21;
            assert_eq!(classify(&fields(word)).map(|c| c.name), Some("ai"));
        }
        assert_eq!(classify(&fields(0xb000_0000)).map(|c| c.name), Some("shufb"));
        assert_eq!(classify(&fields(0xbfff_ffff)).map(|c| c.name), Some("shufb"));
        assert_eq!(classify(&fields(0x4200_0000)).map(|c| c.name), Some("ila"));
    }

    #[test]
    fn arithmetic() {
        let (c, ops) = decode(0x1800_c285); // a $5, $5, $3
        assert_eq!((c.name, c.kind), ("a", OpKind::IntegerArithmetic));
        assert_eq!(&ops[..], &[reg(5), reg(5), reg(3)]);

        let (c, ops) = decode(0x1c00_4183); // ai $3, $3, 1
        assert_eq!(c.name, "ai");
        assert_eq!(&ops[..], &[reg(3), reg(3), simm(1u32, 10)]);

        let (_, ops) = decode(0x1cff_c183); // ai $3, $3, -1
        assert_eq!(ops[2], Operand::Imm(Imm::signed(0x3ff, 10)));

        let (c, ops) = decode(0x4080_0283); // il $3, 5
        assert_eq!(c.name, "il");
        assert_eq!(&ops[..], &[reg(3), simm(5u32, 16)]);

        let (c, ops) = decode(0xb061_0101); // shufb $3, $2, $4, $1
        assert_eq!(c.kind, OpKind::VectorPermute);
        assert_eq!(&ops[..], &[reg(3), reg(2), reg(4), reg(1)]);
    }

    #[test]
    fn memory() {
        let (c, ops) = decode(0x3400_c083); // lqd $3, 48($1)
        assert_eq!(c.kind, OpKind::Load);
        assert_eq!(&ops[..], &[reg(3), simm(48u32, 14), reg(1)]);

        let (c, ops) = decode(0x2400_4081); // stqd $1, 16($1)
        assert_eq!(c.kind, OpKind::Store);
        assert_eq!(&ops[..], &[reg(1), simm(16u32, 14), reg(1)]);
    }

    #[test]
    fn branches() {
        let (c, ops) = decode(0x3200_0200); // br +0x10
        assert_eq!(c.kind, OpKind::Branch);
        assert_eq!(&ops[..], &[simm(0x10u32, 18)]);

        let (c, ops) = decode(0x3300_0180); // brsl $0, +0xc
        assert_eq!(c.effects, Effects::LINK);
        assert_eq!(&ops[..], &[reg(0), simm(0xcu32, 18)]);

        let (c, ops) = decode(0x217f_ff83); // brnz $3, -4
        assert_eq!(c.kind, OpKind::BranchConditional);
        assert_eq!(&ops[..], &[reg(3), simm(0x3fffcu32, 18)]);

        let (c, ops) = decode(0x3000_1000); // bra 0x80
        assert_eq!(c.effects, Effects::ABSOLUTE);
        assert_eq!(&ops[..], &[simm(0x80u32, 18)]);
    }

    #[test]
    fn indirect_branches() {
        let (c, ops) = decode(0x3500_0000); // bi $0
        assert_eq!(c.kind, OpKind::Return);
        assert!(ops.is_empty());

        let (c, ops) = decode(0x3500_0280); // bi $5
        assert_eq!(c.kind, OpKind::Branch);
        assert_eq!(&ops[..], &[reg(5)]);

        let (c, ops) = decode(0x3520_0280); // bisl $0, $5
        assert_eq!(c.effects, Effects::LINK);
        assert_eq!(&ops[..], &[reg(0), reg(5)]);

        let (c, _) = decode(0x3540_0000); // iret
        assert_eq!(c.kind, OpKind::Return);
    }

    #[test]
    fn halts_and_stops() {
        let (c, ops) = decode(0x0000_0000);
        assert_eq!((c.name, c.kind), ("stop", OpKind::Trap));
        assert_eq!(&ops[..], &[uimm(0u32, 14)]);

        let (_, ops) = decode(0x0000_2000); // stop 0x2000
        assert_eq!(&ops[..], &[uimm(0x2000u32, 14)]);

        let (c, ops) = decode(0x7b00_0180); // heq $3, $0
        assert_eq!(c.kind, OpKind::Trap);
        assert_eq!(c.effects, Effects::CONDITIONAL);
        assert_eq!(&ops[..], &[reg(3), reg(0)]);

        let (c, ops) = decode(0x7f00_0180); // heqi $3, 0
        assert_eq!((c.name, c.effects), ("heqi", Effects::CONDITIONAL));
        assert_eq!(&ops[..], &[reg(3), simm(0u32, 10)]);

        assert!(decode(0x0000_0000).0.effects.is_empty());
    }

    #[test]
    fn nops_and_channels() {
        assert_eq!(decode(0x4020_0000).0.kind, OpKind::Nop);
        assert_eq!(decode(0x0020_0000).0.kind, OpKind::Nop);

        let (c, ops) = decode(0x01a0_0e83); // rdch $3, $ch29
        assert_eq!(c.kind, OpKind::SpecialRegister);
        assert_eq!(&ops[..], &[reg(3), Operand::Reg(Reg::Channel(29))]);

        let (_, ops) = decode(0x21a0_1003); // wrch $ch32, $3
        assert_eq!(&ops[..], &[Operand::Reg(Reg::Channel(32)), reg(3)]);
    }

    #[test]
    fn hints() {
        let word = u32::from(Ri18::new().with_op(0x09).with_rt(4).with_i18(8));
        let (c, ops) = decode(word);
        assert_eq!((c.name, c.kind), ("hbrr", OpKind::BranchHint));
        assert_eq!(&ops[..], &[simm(16u32, 11), simm(32u32, 18)]);
    }

    #[test]
    fn unknown() {
        assert!(classify(&fields(0x0080_0000)).is_none()); // 0x004
        assert!(classify(&fields(0x6000_0000)).is_none()); // 0x300
    }
}
