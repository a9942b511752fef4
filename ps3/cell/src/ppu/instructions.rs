use smallvec::smallvec;

use super::forms::*;
use crate::context::{Classified, Fields};
use crate::ir::{Effects, Flag, Imm, OpKind, Operand, Operands, Reg};

/// `ori r0, r0, 0`, the preferred no-op.
pub const NOP_WORD: u32 = 0x6000_0000;

/// BO values with both "ignore CR" and "ignore CTR" set branch unconditionally.
#[inline(always)]
pub fn branch_always(bo: u8) -> bool {
    bo & 0x14 == 0x14
}

/// TO value trapping on every comparison outcome (`trap`, `tw 31,...`).
pub const TRAP_ALWAYS: u8 = 0x1f;

/// How the operands of an instruction are laid out in the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    NoOperands,

    // Branches and system
    Branch,
    BranchCond,
    BranchLr,
    BranchCtr,
    SystemCall,
    TrapImm,
    TrapReg,

    // D and DS forms
    ArithImm,
    LogicalImm,
    CmpImm(bool), // true == signed
    MemD(Bank),
    MemDs,

    // Rotates
    RotateWordImm,
    RotateWordReg,
    RotateDoubleImm,
    RotateDoubleReg,

    // X and XO forms
    ArithReg,
    ArithUnary,
    LogicalReg,
    LogicalUnary,
    ShiftWordImm,
    ShiftDoubleImm,
    CmpReg(bool),
    MemX(Bank),
    CacheOp,
    Barrier,
    MoveFromSpr,
    MoveToSpr,
    MoveFromCr,
    MoveToCrFields,
    CrLogical,
    CrMove,

    // Floating point
    FloatArith3,
    FloatMul,
    FloatMulAdd,
    FloatUnary,
    FloatCmp,
    MoveFromFpscr,
    MoveToFpscr,

    // VMX
    VecArith3,
    VecArith4,
    VecShiftOctet,
    VecUnary,
    VecSplat,
    VecSplatImm,
    VecConvert,
    VecCmp,
    MoveFromVscr,
    MoveToVscr,
}

/// Register file addressed by the data operand of a load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Gpr,
    Fpr,
    Vr,
}

impl Bank {
    fn reg(self, n: u8) -> Reg {
        match self {
            Bank::Gpr => Reg::Gpr(n),
            Bank::Fpr => Reg::Fpr(n),
            Bank::Vr => Reg::Vr(n),
        }
    }
}

impl Form {
    /// Condition register field updated when the Rc bit of the word is set.
    fn record(self) -> Option<Effects> {
        use Form::*;
        match self {
            ArithReg | ArithUnary | LogicalReg | LogicalUnary | ShiftWordImm | ShiftDoubleImm
            | RotateWordImm | RotateWordReg | RotateDoubleImm | RotateDoubleReg => {
                Some(Effects::SETS_CR0)
            }
            FloatArith3 | FloatMul | FloatMulAdd | FloatUnary | MoveFromFpscr | MoveToFpscr => {
                Some(Effects::SETS_CR1)
            }
            _ => None,
        }
    }
}

/// Primary opcodes whose instructions are selected by a second opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Vector,
    BranchCondReg,
    Rotate64,
    Extended,
    LoadDouble,
    FloatSingle,
    StoreDouble,
    FloatDouble,
}

impl Group {
    /// Shift and mask of the extended opcode field.
    const fn layout(self) -> (u32, u32) {
        match self {
            Group::Vector => (0, 0x7ff),
            Group::BranchCondReg | Group::Extended | Group::FloatDouble => (1, 0x3ff),
            Group::Rotate64 => (1, 0xf),
            Group::LoadDouble | Group::StoreDouble => (0, 0x3),
            Group::FloatSingle => (1, 0x1f),
        }
    }

    pub fn extended(self, word: u32) -> u16 {
        let (shift, mask) = self.layout();
        ((word >> shift) & mask) as u16
    }

    fn table(self) -> &'static [InstructionInfo] {
        match self {
            Group::Vector => &VECTOR_TABLE,
            Group::BranchCondReg => &BRANCH_COND_REG_TABLE,
            Group::Rotate64 => &ROTATE64_TABLE,
            Group::Extended => &EXTENDED_TABLE,
            Group::LoadDouble => &LOAD_DOUBLE_TABLE,
            Group::FloatSingle => &FLOAT_SINGLE_TABLE,
            Group::StoreDouble => &STORE_DOUBLE_TABLE,
            Group::FloatDouble => &FLOAT_DOUBLE_TABLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionInfo {
    Reserved,
    Group(Group),
    Op(&'static str, OpKind, Form, Effects),
}

/// Splits a word into its primary and, where the primary selects a group, extended opcode.
pub fn fields(word: u32) -> Fields {
    let primary = (word >> 26) as u16;
    let extended = match PRIMARY_TABLE[primary as usize] {
        InstructionInfo::Group(group) => Some(group.extended(word)),
        _ => None,
    };
    Fields { word, primary, extended }
}

/// Looks the opcode up and applies the refinements that depend on operand fields:
/// the canonical no-op, and branches whose BO field makes them unconditional or returns.
pub fn classify(fields: &Fields) -> Option<Classified<Form>> {
    let info = match (PRIMARY_TABLE[fields.primary as usize], fields.extended) {
        (InstructionInfo::Group(group), Some(xo)) => group.table()[xo as usize],
        (info, _) => info,
    };

    let InstructionInfo::Op(name, kind, form, effects) = info else {
        return None;
    };
    let mut classified = Classified { name, kind, form, effects };
    let word = fields.word;

    match form {
        Form::LogicalImm if word == NOP_WORD => {
            classified.name = "nop";
            classified.kind = OpKind::Nop;
            classified.form = Form::NoOperands;
        }
        Form::BranchCond if branch_always(BForm::from(word).bo()) => {
            classified.kind = OpKind::Branch;
        }
        Form::BranchLr | Form::BranchCtr => {
            let x = XForm::from(word);
            if branch_always(x.rt()) {
                classified.kind = OpKind::Branch;
                if form == Form::BranchLr && !x.rc() {
                    classified.name = "blr";
                    classified.kind = OpKind::Return;
                    classified.form = Form::NoOperands;
                }
            }
        }
        _ => {}
    }
    Some(classified)
}

#[inline(always)]
fn gpr(n: u8) -> Operand {
    Reg::Gpr(n).into()
}

#[inline(always)]
fn fpr(n: u8) -> Operand {
    Reg::Fpr(n).into()
}

#[inline(always)]
fn vr(n: u8) -> Operand {
    Reg::Vr(n).into()
}

#[inline(always)]
fn simm(field: impl Into<u64>, width: u32) -> Operand {
    Imm::signed(field.into(), width).into()
}

#[inline(always)]
fn uimm(field: impl Into<u64>, width: u32) -> Operand {
    Imm::unsigned(field.into(), width).into()
}

#[inline(always)]
fn cr_bit(n: u8) -> Operand {
    Flag::CrBit(n).into()
}

#[inline(always)]
fn cr_field(n: u8) -> Operand {
    Flag::CrField(n).into()
}

fn branch_effects(lk: bool, aa: bool) -> Effects {
    let mut effects = Effects::empty();
    effects.set(Effects::LINK, lk);
    effects.set(Effects::ABSOLUTE, aa);
    effects
}

/// Extracts the operands of `word` according to `form`, together with the effects
/// selected by bits of the word (Rc, OE, LK, AA).
///
/// Displacements are returned in bytes, already shifted and sign extended.
pub fn decode_operands(form: Form, word: u32) -> (Operands, Effects) {
    use Form::*;

    let mut effects = Effects::empty();
    let operands: Operands = match form {
        NoOperands | SystemCall | Barrier => Operands::new(),

        Branch => {
            let i = IForm::from(word);
            effects |= branch_effects(i.lk(), i.aa());
            smallvec![simm(i.li() << 2, 26)]
        }
        BranchCond => {
            let b = BForm::from(word);
            effects |= branch_effects(b.lk(), b.aa());
            let displacement = simm((b.bd() as u32) << 2, 16);
            if branch_always(b.bo()) {
                smallvec![displacement]
            } else {
                smallvec![uimm(b.bo(), 5), cr_bit(b.bi()), displacement]
            }
        }
        BranchLr | BranchCtr => {
            let x = XForm::from(word);
            effects.set(Effects::LINK, x.rc());
            let target: Operand = if form == BranchLr { Reg::Lr.into() } else { Reg::Ctr.into() };
            if branch_always(x.rt()) {
                smallvec![target]
            } else {
                smallvec![uimm(x.rt(), 5), cr_bit(x.ra()), target]
            }
        }
        TrapImm => {
            let d = DForm::from(word);
            effects.set(Effects::CONDITIONAL, d.rt() != TRAP_ALWAYS);
            smallvec![uimm(d.rt(), 5), gpr(d.ra()), simm(d.d(), 16)]
        }
        TrapReg => {
            let x = XForm::from(word);
            effects.set(Effects::CONDITIONAL, x.rt() != TRAP_ALWAYS);
            smallvec![uimm(x.rt(), 5), gpr(x.ra()), gpr(x.rb())]
        }

        ArithImm => {
            let d = DForm::from(word);
            smallvec![gpr(d.rt()), gpr(d.ra()), simm(d.d(), 16)]
        }
        LogicalImm => {
            let d = DForm::from(word);
            smallvec![gpr(d.ra()), gpr(d.rt()), uimm(d.d(), 16)]
        }
        CmpImm(signed) => {
            let d = DForm::from(word);
            let imm = if signed { simm(d.d(), 16) } else { uimm(d.d(), 16) };
            smallvec![cr_field(d.rt() >> 2), uimm(d.rt() & 1, 1), gpr(d.ra()), imm]
        }
        MemD(bank) => {
            let d = DForm::from(word);
            smallvec![Operand::Reg(bank.reg(d.rt())), simm(d.d(), 16), gpr(d.ra())]
        }
        MemDs => {
            let ds = DsForm::from(word);
            smallvec![gpr(ds.rt()), simm((ds.ds() as u32) << 2, 16), gpr(ds.ra())]
        }

        RotateWordImm => {
            let m = MForm::from(word);
            smallvec![gpr(m.ra()), gpr(m.rs()), uimm(m.rb(), 5), uimm(m.mb(), 5), uimm(m.me(), 5)]
        }
        RotateWordReg => {
            let m = MForm::from(word);
            smallvec![gpr(m.ra()), gpr(m.rs()), gpr(m.rb()), uimm(m.mb(), 5), uimm(m.me(), 5)]
        }
        RotateDoubleImm => {
            let md = MdForm::from(word);
            smallvec![gpr(md.ra()), gpr(md.rs()), uimm(md.shift(), 6), uimm(mask_begin64(md.mb()), 6)]
        }
        RotateDoubleReg => {
            let mds = MdsForm::from(word);
            smallvec![gpr(mds.ra()), gpr(mds.rs()), gpr(mds.rb()), uimm(mask_begin64(mds.mb()), 6)]
        }

        ArithReg => {
            let xo = XoForm::from(word);
            effects.set(Effects::SETS_OV, xo.oe());
            smallvec![gpr(xo.rt()), gpr(xo.ra()), gpr(xo.rb())]
        }
        ArithUnary => {
            let xo = XoForm::from(word);
            effects.set(Effects::SETS_OV, xo.oe());
            smallvec![gpr(xo.rt()), gpr(xo.ra())]
        }
        LogicalReg => {
            let x = XForm::from(word);
            smallvec![gpr(x.ra()), gpr(x.rt()), gpr(x.rb())]
        }
        LogicalUnary => {
            let x = XForm::from(word);
            smallvec![gpr(x.ra()), gpr(x.rt())]
        }
        ShiftWordImm => {
            let x = XForm::from(word);
            smallvec![gpr(x.ra()), gpr(x.rt()), uimm(x.rb(), 5)]
        }
        ShiftDoubleImm => {
            let x = XForm::from(word);
            let sh = x.rb() | ((x.xo() & 1) as u8) << 5;
            smallvec![gpr(x.ra()), gpr(x.rt()), uimm(sh, 6)]
        }
        CmpReg(_) => {
            let x = XForm::from(word);
            smallvec![cr_field(x.rt() >> 2), uimm(x.rt() & 1, 1), gpr(x.ra()), gpr(x.rb())]
        }
        MemX(bank) => {
            let x = XForm::from(word);
            smallvec![Operand::Reg(bank.reg(x.rt())), gpr(x.ra()), gpr(x.rb())]
        }
        CacheOp => {
            let x = XForm::from(word);
            smallvec![gpr(x.ra()), gpr(x.rb())]
        }
        MoveFromSpr => {
            let x = XForm::from(word);
            smallvec![gpr(x.rt()), Operand::Reg(Reg::from_spr(spr(x)))]
        }
        MoveToSpr => {
            let x = XForm::from(word);
            smallvec![Operand::Reg(Reg::from_spr(spr(x))), gpr(x.rt())]
        }
        MoveFromCr => smallvec![gpr(XForm::from(word).rt())],
        MoveToCrFields => {
            let x = XForm::from(word);
            smallvec![uimm(crm(x), 8), gpr(x.rt())]
        }
        CrLogical => {
            let x = XForm::from(word);
            smallvec![cr_bit(x.rt()), cr_bit(x.ra()), cr_bit(x.rb())]
        }
        CrMove => {
            let x = XForm::from(word);
            smallvec![cr_field(x.rt() >> 2), cr_field(x.ra() >> 2)]
        }

        FloatArith3 => {
            let a = AForm::from(word);
            smallvec![fpr(a.frt()), fpr(a.fra()), fpr(a.frb())]
        }
        FloatMul => {
            let a = AForm::from(word);
            smallvec![fpr(a.frt()), fpr(a.fra()), fpr(a.frc())]
        }
        FloatMulAdd => {
            let a = AForm::from(word);
            smallvec![fpr(a.frt()), fpr(a.fra()), fpr(a.frc()), fpr(a.frb())]
        }
        FloatUnary => {
            let a = AForm::from(word);
            smallvec![fpr(a.frt()), fpr(a.frb())]
        }
        FloatCmp => {
            let x = XForm::from(word);
            smallvec![cr_field(x.rt() >> 2), fpr(x.ra()), fpr(x.rb())]
        }
        MoveFromFpscr => smallvec![fpr(XForm::from(word).rt())],
        MoveToFpscr => {
            let x = XForm::from(word);
            smallvec![uimm(flm(x), 8), fpr(x.rb())]
        }

        VecArith3 => {
            let v = VxForm::from(word);
            smallvec![vr(v.vd()), vr(v.va()), vr(v.vb())]
        }
        VecArith4 => {
            let v = VaForm::from(word);
            smallvec![vr(v.vd()), vr(v.va()), vr(v.vb()), vr(v.vc())]
        }
        VecShiftOctet => {
            let v = VaForm::from(word);
            smallvec![vr(v.vd()), vr(v.va()), vr(v.vb()), uimm(v.vc() & 0xf, 4)]
        }
        VecUnary => {
            let v = VxForm::from(word);
            smallvec![vr(v.vd()), vr(v.vb())]
        }
        VecSplat | VecConvert => {
            let v = VxForm::from(word);
            smallvec![vr(v.vd()), vr(v.vb()), uimm(v.va(), 5)]
        }
        VecSplatImm => {
            let v = VxForm::from(word);
            smallvec![vr(v.vd()), simm(v.va(), 5)]
        }
        VecCmp => {
            let v = VxForm::from(word);
            effects.set(Effects::SETS_CR6, v.xo() & 0x400 != 0);
            smallvec![vr(v.vd()), vr(v.va()), vr(v.vb())]
        }
        MoveFromVscr => smallvec![vr(VxForm::from(word).vd())],
        MoveToVscr => smallvec![vr(VxForm::from(word).vb())],
    };

    if let Some(record) = form.record() {
        if word & 1 != 0 {
            effects |= record;
        }
    }
    (operands, effects)
}

const NONE: Effects = Effects::empty();
const CA: Effects = Effects::SETS_CA;
const CR0: Effects = Effects::SETS_CR0;
const UPD: Effects = Effects::UPDATE;

const fn build_primary_table() -> [InstructionInfo; 64] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    [
        Reserved,
        Reserved,
        Op("tdi", Trap, TrapImm, NONE),
        Op("twi", Trap, TrapImm, NONE),
        InstructionInfo::Group(self::Group::Vector),
        Reserved,
        Reserved,
        Op("mulli", IntegerArithmetic, ArithImm, NONE),
        // 8
        Op("subfic", IntegerArithmetic, ArithImm, CA),
        Reserved,
        Op("cmpli", Compare, CmpImm(false), NONE),
        Op("cmpi", Compare, CmpImm(true), NONE),
        Op("addic", IntegerArithmetic, ArithImm, CA),
        Op("addic.", IntegerArithmetic, ArithImm, CA.union(CR0)),
        Op("addi", IntegerArithmetic, ArithImm, NONE),
        Op("addis", IntegerArithmetic, ArithImm, NONE),
        // 16
        Op("bc", BranchConditional, BranchCond, NONE),
        Op("sc", OpKind::SystemCall, Form::SystemCall, NONE),
        Op("b", OpKind::Branch, Form::Branch, NONE),
        InstructionInfo::Group(self::Group::BranchCondReg),
        Op("rlwimi", ShiftRotate, RotateWordImm, NONE),
        Op("rlwinm", ShiftRotate, RotateWordImm, NONE),
        Reserved,
        Op("rlwnm", ShiftRotate, RotateWordReg, NONE),
        // 24
        Op("ori", IntegerLogical, LogicalImm, NONE),
        Op("oris", IntegerLogical, LogicalImm, NONE),
        Op("xori", IntegerLogical, LogicalImm, NONE),
        Op("xoris", IntegerLogical, LogicalImm, NONE),
        Op("andi.", IntegerLogical, LogicalImm, CR0),
        Op("andis.", IntegerLogical, LogicalImm, CR0),
        InstructionInfo::Group(self::Group::Rotate64),
        InstructionInfo::Group(self::Group::Extended),
        // 32
        Op("lwz", Load, MemD(Bank::Gpr), NONE),
        Op("lwzu", Load, MemD(Bank::Gpr), UPD),
        Op("lbz", Load, MemD(Bank::Gpr), NONE),
        Op("lbzu", Load, MemD(Bank::Gpr), UPD),
        Op("stw", Store, MemD(Bank::Gpr), NONE),
        Op("stwu", Store, MemD(Bank::Gpr), UPD),
        Op("stb", Store, MemD(Bank::Gpr), NONE),
        Op("stbu", Store, MemD(Bank::Gpr), UPD),
        // 40
        Op("lhz", Load, MemD(Bank::Gpr), NONE),
        Op("lhzu", Load, MemD(Bank::Gpr), UPD),
        Op("lha", Load, MemD(Bank::Gpr), NONE),
        Op("lhau", Load, MemD(Bank::Gpr), UPD),
        Op("sth", Store, MemD(Bank::Gpr), NONE),
        Op("sthu", Store, MemD(Bank::Gpr), UPD),
        Op("lmw", Load, MemD(Bank::Gpr), NONE),
        Op("stmw", Store, MemD(Bank::Gpr), NONE),
        // 48
        Op("lfs", Load, MemD(Bank::Fpr), NONE),
        Op("lfsu", Load, MemD(Bank::Fpr), UPD),
        Op("lfd", Load, MemD(Bank::Fpr), NONE),
        Op("lfdu", Load, MemD(Bank::Fpr), UPD),
        Op("stfs", Store, MemD(Bank::Fpr), NONE),
        Op("stfsu", Store, MemD(Bank::Fpr), UPD),
        Op("stfd", Store, MemD(Bank::Fpr), NONE),
        Op("stfdu", Store, MemD(Bank::Fpr), UPD),
        // 56
        Reserved,
        Reserved,
        InstructionInfo::Group(self::Group::LoadDouble),
        InstructionInfo::Group(self::Group::FloatSingle),
        Reserved,
        Reserved,
        InstructionInfo::Group(self::Group::StoreDouble),
        InstructionInfo::Group(self::Group::FloatDouble),
    ]
}

/// Primary opcode 31.
const fn build_extended_table() -> [InstructionInfo; 1024] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let mut table = [Reserved; 1024];

    // XO-form arithmetic, present twice: with and without OE.
    let arith = [
        (8, Op("subfc", IntegerArithmetic, ArithReg, CA)),
        (10, Op("addc", IntegerArithmetic, ArithReg, CA)),
        (40, Op("subf", IntegerArithmetic, ArithReg, NONE)),
        (104, Op("neg", IntegerArithmetic, ArithUnary, NONE)),
        (136, Op("subfe", IntegerArithmetic, ArithReg, CA)),
        (138, Op("adde", IntegerArithmetic, ArithReg, CA)),
        (200, Op("subfze", IntegerArithmetic, ArithUnary, CA)),
        (202, Op("addze", IntegerArithmetic, ArithUnary, CA)),
        (232, Op("subfme", IntegerArithmetic, ArithUnary, CA)),
        (233, Op("mulld", IntegerArithmetic, ArithReg, NONE)),
        (234, Op("addme", IntegerArithmetic, ArithUnary, CA)),
        (235, Op("mullw", IntegerArithmetic, ArithReg, NONE)),
        (266, Op("add", IntegerArithmetic, ArithReg, NONE)),
        (457, Op("divdu", IntegerArithmetic, ArithReg, NONE)),
        (459, Op("divwu", IntegerArithmetic, ArithReg, NONE)),
        (489, Op("divd", IntegerArithmetic, ArithReg, NONE)),
        (491, Op("divw", IntegerArithmetic, ArithReg, NONE)),
    ];
    let mut i = 0;
    while i < arith.len() {
        let (xo, info) = arith[i];
        table[xo] = info;
        table[xo | 0x200] = info;
        i += 1;
    }

    let ops = [
        (0, Op("cmp", Compare, CmpReg(true), NONE)),
        (4, Op("tw", Trap, TrapReg, NONE)),
        (6, Op("lvsl", VectorPermute, MemX(Bank::Vr), NONE)),
        (7, Op("lvebx", Load, MemX(Bank::Vr), NONE)),
        (9, Op("mulhdu", IntegerArithmetic, ArithReg, NONE)),
        (11, Op("mulhwu", IntegerArithmetic, ArithReg, NONE)),
        (19, Op("mfcr", ConditionRegister, MoveFromCr, NONE)),
        (20, Op("lwarx", Load, MemX(Bank::Gpr), NONE)),
        (21, Op("ldx", Load, MemX(Bank::Gpr), NONE)),
        (23, Op("lwzx", Load, MemX(Bank::Gpr), NONE)),
        (24, Op("slw", ShiftRotate, LogicalReg, NONE)),
        (26, Op("cntlzw", IntegerLogical, LogicalUnary, NONE)),
        (27, Op("sld", ShiftRotate, LogicalReg, NONE)),
        (28, Op("and", IntegerLogical, LogicalReg, NONE)),
        (32, Op("cmpl", Compare, CmpReg(false), NONE)),
        (38, Op("lvsr", VectorPermute, MemX(Bank::Vr), NONE)),
        (53, Op("ldux", Load, MemX(Bank::Gpr), UPD)),
        (54, Op("dcbst", CacheControl, CacheOp, NONE)),
        (55, Op("lwzux", Load, MemX(Bank::Gpr), UPD)),
        (58, Op("cntlzd", IntegerLogical, LogicalUnary, NONE)),
        (60, Op("andc", IntegerLogical, LogicalReg, NONE)),
        (68, Op("td", Trap, TrapReg, NONE)),
        (73, Op("mulhd", IntegerArithmetic, ArithReg, NONE)),
        (75, Op("mulhw", IntegerArithmetic, ArithReg, NONE)),
        (84, Op("ldarx", Load, MemX(Bank::Gpr), NONE)),
        (86, Op("dcbf", CacheControl, CacheOp, NONE)),
        (87, Op("lbzx", Load, MemX(Bank::Gpr), NONE)),
        (103, Op("lvx", Load, MemX(Bank::Vr), NONE)),
        (119, Op("lbzux", Load, MemX(Bank::Gpr), UPD)),
        (124, Op("nor", IntegerLogical, LogicalReg, NONE)),
        (135, Op("stvebx", Store, MemX(Bank::Vr), NONE)),
        (144, Op("mtcrf", ConditionRegister, MoveToCrFields, NONE)),
        (149, Op("stdx", Store, MemX(Bank::Gpr), NONE)),
        (150, Op("stwcx.", Store, MemX(Bank::Gpr), CR0)),
        (151, Op("stwx", Store, MemX(Bank::Gpr), NONE)),
        (181, Op("stdux", Store, MemX(Bank::Gpr), UPD)),
        (183, Op("stwux", Store, MemX(Bank::Gpr), UPD)),
        (214, Op("stdcx.", Store, MemX(Bank::Gpr), CR0)),
        (215, Op("stbx", Store, MemX(Bank::Gpr), NONE)),
        (231, Op("stvx", Store, MemX(Bank::Vr), NONE)),
        (246, Op("dcbtst", CacheControl, CacheOp, NONE)),
        (247, Op("stbux", Store, MemX(Bank::Gpr), UPD)),
        (278, Op("dcbt", CacheControl, CacheOp, NONE)),
        (279, Op("lhzx", Load, MemX(Bank::Gpr), NONE)),
        (284, Op("eqv", IntegerLogical, LogicalReg, NONE)),
        (311, Op("lhzux", Load, MemX(Bank::Gpr), UPD)),
        (316, Op("xor", IntegerLogical, LogicalReg, NONE)),
        (339, Op("mfspr", SpecialRegister, MoveFromSpr, NONE)),
        (341, Op("lwax", Load, MemX(Bank::Gpr), NONE)),
        (343, Op("lhax", Load, MemX(Bank::Gpr), NONE)),
        (359, Op("lvxl", Load, MemX(Bank::Vr), NONE)),
        (371, Op("mftb", SpecialRegister, MoveFromSpr, NONE)),
        (375, Op("lhaux", Load, MemX(Bank::Gpr), UPD)),
        (407, Op("sthx", Store, MemX(Bank::Gpr), NONE)),
        (412, Op("orc", IntegerLogical, LogicalReg, NONE)),
        (439, Op("sthux", Store, MemX(Bank::Gpr), UPD)),
        (444, Op("or", IntegerLogical, LogicalReg, NONE)),
        (467, Op("mtspr", SpecialRegister, MoveToSpr, NONE)),
        (476, Op("nand", IntegerLogical, LogicalReg, NONE)),
        (519, Op("lvlx", Load, MemX(Bank::Vr), NONE)),
        (532, Op("ldbrx", Load, MemX(Bank::Gpr), NONE)),
        (534, Op("lwbrx", Load, MemX(Bank::Gpr), NONE)),
        (535, Op("lfsx", Load, MemX(Bank::Fpr), NONE)),
        (536, Op("srw", ShiftRotate, LogicalReg, NONE)),
        (539, Op("srd", ShiftRotate, LogicalReg, NONE)),
        (551, Op("lvrx", Load, MemX(Bank::Vr), NONE)),
        (567, Op("lfsux", Load, MemX(Bank::Fpr), UPD)),
        (598, Op("sync", Sync, Barrier, NONE)),
        (599, Op("lfdx", Load, MemX(Bank::Fpr), NONE)),
        (631, Op("lfdux", Load, MemX(Bank::Fpr), UPD)),
        (647, Op("stvlx", Store, MemX(Bank::Vr), NONE)),
        (662, Op("stwbrx", Store, MemX(Bank::Gpr), NONE)),
        (663, Op("stfsx", Store, MemX(Bank::Fpr), NONE)),
        (679, Op("stvrx", Store, MemX(Bank::Vr), NONE)),
        (695, Op("stfsux", Store, MemX(Bank::Fpr), UPD)),
        (727, Op("stfdx", Store, MemX(Bank::Fpr), NONE)),
        (759, Op("stfdux", Store, MemX(Bank::Fpr), UPD)),
        (790, Op("lhbrx", Load, MemX(Bank::Gpr), NONE)),
        (792, Op("sraw", ShiftRotate, LogicalReg, CA)),
        (794, Op("srad", ShiftRotate, LogicalReg, CA)),
        (824, Op("srawi", ShiftRotate, ShiftWordImm, CA)),
        // sradi carries sh5 in the low xo bit
        (826, Op("sradi", ShiftRotate, ShiftDoubleImm, CA)),
        (827, Op("sradi", ShiftRotate, ShiftDoubleImm, CA)),
        (854, Op("eieio", Sync, Barrier, NONE)),
        (918, Op("sthbrx", Store, MemX(Bank::Gpr), NONE)),
        (922, Op("extsh", IntegerLogical, LogicalUnary, NONE)),
        (954, Op("extsb", IntegerLogical, LogicalUnary, NONE)),
        (982, Op("icbi", CacheControl, CacheOp, NONE)),
        (983, Op("stfiwx", Store, MemX(Bank::Fpr), NONE)),
        (986, Op("extsw", IntegerLogical, LogicalUnary, NONE)),
        (1014, Op("dcbz", CacheControl, CacheOp, NONE)),
    ];
    let mut i = 0;
    while i < ops.len() {
        let (xo, info) = ops[i];
        table[xo] = info;
        i += 1;
    }

    table
}

/// Primary opcode 19.
const fn build_branch_cond_reg_table() -> [InstructionInfo; 1024] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let mut table = [Reserved; 1024];
    table[0] = Op("mcrf", ConditionRegister, CrMove, NONE);
    table[16] = Op("bclr", BranchConditional, BranchLr, NONE);
    table[33] = Op("crnor", ConditionRegister, CrLogical, NONE);
    table[129] = Op("crandc", ConditionRegister, CrLogical, NONE);
    table[150] = Op("isync", Sync, Barrier, NONE);
    table[193] = Op("crxor", ConditionRegister, CrLogical, NONE);
    table[225] = Op("crnand", ConditionRegister, CrLogical, NONE);
    table[257] = Op("crand", ConditionRegister, CrLogical, NONE);
    table[289] = Op("creqv", ConditionRegister, CrLogical, NONE);
    table[417] = Op("crorc", ConditionRegister, CrLogical, NONE);
    table[449] = Op("cror", ConditionRegister, CrLogical, NONE);
    table[528] = Op("bcctr", BranchConditional, BranchCtr, NONE);
    table
}

/// Primary opcode 30, keyed by the MD xo and sh5 bits (MDS forms use all four as xo).
const fn build_rotate64_table() -> [InstructionInfo; 16] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let mut table = [Reserved; 16];
    table[0] = Op("rldicl", ShiftRotate, RotateDoubleImm, NONE);
    table[1] = Op("rldicl", ShiftRotate, RotateDoubleImm, NONE);
    table[2] = Op("rldicr", ShiftRotate, RotateDoubleImm, NONE);
    table[3] = Op("rldicr", ShiftRotate, RotateDoubleImm, NONE);
    table[4] = Op("rldic", ShiftRotate, RotateDoubleImm, NONE);
    table[5] = Op("rldic", ShiftRotate, RotateDoubleImm, NONE);
    table[6] = Op("rldimi", ShiftRotate, RotateDoubleImm, NONE);
    table[7] = Op("rldimi", ShiftRotate, RotateDoubleImm, NONE);
    table[8] = Op("rldcl", ShiftRotate, RotateDoubleReg, NONE);
    table[9] = Op("rldcr", ShiftRotate, RotateDoubleReg, NONE);
    table
}

/// Primary opcode 58.
const fn build_load_double_table() -> [InstructionInfo; 4] {
    use InstructionInfo::*;
    use OpKind::*;

    [
        Op("ld", Load, Form::MemDs, NONE),
        Op("ldu", Load, Form::MemDs, UPD),
        Op("lwa", Load, Form::MemDs, NONE),
        Reserved,
    ]
}

/// Primary opcode 62.
const fn build_store_double_table() -> [InstructionInfo; 4] {
    use InstructionInfo::*;
    use OpKind::*;

    [
        Op("std", Store, Form::MemDs, NONE),
        Op("stdu", Store, Form::MemDs, UPD),
        Reserved,
        Reserved,
    ]
}

/// Primary opcode 59, single precision A-forms.
const fn build_float_single_table() -> [InstructionInfo; 32] {
    use InstructionInfo::*;
    use Form::*;

    let f = OpKind::FloatArithmetic;
    let mut table = [Reserved; 32];
    table[18] = Op("fdivs", f, FloatArith3, NONE);
    table[20] = Op("fsubs", f, FloatArith3, NONE);
    table[21] = Op("fadds", f, FloatArith3, NONE);
    table[22] = Op("fsqrts", f, FloatUnary, NONE);
    table[24] = Op("fres", f, FloatUnary, NONE);
    table[25] = Op("fmuls", f, FloatMul, NONE);
    table[28] = Op("fmsubs", f, FloatMulAdd, NONE);
    table[29] = Op("fmadds", f, FloatMulAdd, NONE);
    table[30] = Op("fnmsubs", f, FloatMulAdd, NONE);
    table[31] = Op("fnmadds", f, FloatMulAdd, NONE);
    table
}

/// Primary opcode 63. A-forms only decode 5 bits of xo, so they fill every slot whose
/// low bits match; X-forms are written afterwards.
const fn build_float_double_table() -> [InstructionInfo; 1024] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let f = FloatArithmetic;
    let mut table = [Reserved; 1024];

    let a_forms = [
        (18, Op("fdiv", f, FloatArith3, NONE)),
        (20, Op("fsub", f, FloatArith3, NONE)),
        (21, Op("fadd", f, FloatArith3, NONE)),
        (22, Op("fsqrt", f, FloatUnary, NONE)),
        (23, Op("fsel", f, FloatMulAdd, NONE)),
        (25, Op("fmul", f, FloatMul, NONE)),
        (26, Op("frsqrte", f, FloatUnary, NONE)),
        (28, Op("fmsub", f, FloatMulAdd, NONE)),
        (29, Op("fmadd", f, FloatMulAdd, NONE)),
        (30, Op("fnmsub", f, FloatMulAdd, NONE)),
        (31, Op("fnmadd", f, FloatMulAdd, NONE)),
    ];
    let mut i = 0;
    while i < a_forms.len() {
        let (xo, info) = a_forms[i];
        let mut slot = xo;
        while slot < 1024 {
            table[slot] = info;
            slot += 32;
        }
        i += 1;
    }

    table[0] = Op("fcmpu", Compare, FloatCmp, NONE);
    table[12] = Op("frsp", f, FloatUnary, NONE);
    table[14] = Op("fctiw", f, FloatUnary, NONE);
    table[15] = Op("fctiwz", f, FloatUnary, NONE);
    table[32] = Op("fcmpo", Compare, FloatCmp, NONE);
    table[40] = Op("fneg", f, FloatUnary, NONE);
    table[72] = Op("fmr", f, FloatUnary, NONE);
    table[136] = Op("fnabs", f, FloatUnary, NONE);
    table[264] = Op("fabs", f, FloatUnary, NONE);
    table[583] = Op("mffs", SpecialRegister, MoveFromFpscr, NONE);
    table[711] = Op("mtfsf", SpecialRegister, MoveToFpscr, NONE);
    table[814] = Op("fctid", f, FloatUnary, NONE);
    table[815] = Op("fctidz", f, FloatUnary, NONE);
    table[846] = Op("fcfid", f, FloatUnary, NONE);
    table
}

/// Primary opcode 4, keyed by the 11-bit VX xo. VA-forms use only the low 6 bits and are
/// replicated like the float A-forms. Compares appear again with Rc (bit 10) set.
const fn build_vector_table() -> [InstructionInfo; 2048] {
    use InstructionInfo::*;
    use OpKind::*;
    use Form::*;

    let mut table = [Reserved; 2048];

    let va_forms = [
        (32, Op("vmhaddshs", VectorArithmetic, VecArith4, NONE)),
        (33, Op("vmhraddshs", VectorArithmetic, VecArith4, NONE)),
        (34, Op("vmladduhm", VectorArithmetic, VecArith4, NONE)),
        (36, Op("vmsumubm", VectorArithmetic, VecArith4, NONE)),
        (37, Op("vmsummbm", VectorArithmetic, VecArith4, NONE)),
        (38, Op("vmsumuhm", VectorArithmetic, VecArith4, NONE)),
        (39, Op("vmsumuhs", VectorArithmetic, VecArith4, NONE)),
        (40, Op("vmsumshm", VectorArithmetic, VecArith4, NONE)),
        (41, Op("vmsumshs", VectorArithmetic, VecArith4, NONE)),
        (42, Op("vsel", VectorPermute, VecArith4, NONE)),
        (43, Op("vperm", VectorPermute, VecArith4, NONE)),
        (44, Op("vsldoi", VectorPermute, VecShiftOctet, NONE)),
        (46, Op("vmaddfp", VectorArithmetic, VecArith4, NONE)),
        (47, Op("vnmsubfp", VectorArithmetic, VecArith4, NONE)),
    ];
    let mut i = 0;
    while i < va_forms.len() {
        let (xo, info) = va_forms[i];
        let mut slot = xo;
        while slot < 2048 {
            table[slot] = info;
            slot += 64;
        }
        i += 1;
    }

    let compares = [
        (6, "vcmpequb"),
        (70, "vcmpequh"),
        (134, "vcmpequw"),
        (198, "vcmpeqfp"),
        (454, "vcmpgefp"),
        (518, "vcmpgtub"),
        (646, "vcmpgtuw"),
        (710, "vcmpgtfp"),
        (902, "vcmpgtsw"),
        (966, "vcmpbfp"),
    ];
    let mut i = 0;
    while i < compares.len() {
        let (xo, name) = compares[i];
        table[xo] = Op(name, Compare, VecCmp, NONE);
        table[xo | 0x400] = Op(name, Compare, VecCmp, NONE);
        i += 1;
    }

    let vx_forms = [
        (0, Op("vaddubm", VectorArithmetic, VecArith3, NONE)),
        (1024, Op("vsububm", VectorArithmetic, VecArith3, NONE)),
        (64, Op("vadduhm", VectorArithmetic, VecArith3, NONE)),
        (1088, Op("vsubuhm", VectorArithmetic, VecArith3, NONE)),
        (128, Op("vadduwm", VectorArithmetic, VecArith3, NONE)),
        (1152, Op("vsubuwm", VectorArithmetic, VecArith3, NONE)),
        (2, Op("vmaxub", VectorArithmetic, VecArith3, NONE)),
        (8, Op("vmuloub", VectorArithmetic, VecArith3, NONE)),
        (10, Op("vaddfp", VectorArithmetic, VecArith3, NONE)),
        (74, Op("vsubfp", VectorArithmetic, VecArith3, NONE)),
        (1034, Op("vmaxfp", VectorArithmetic, VecArith3, NONE)),
        (1098, Op("vminfp", VectorArithmetic, VecArith3, NONE)),
        (266, Op("vrefp", VectorArithmetic, VecUnary, NONE)),
        (330, Op("vrsqrtefp", VectorArithmetic, VecUnary, NONE)),
        (1028, Op("vand", VectorArithmetic, VecArith3, NONE)),
        (1092, Op("vandc", VectorArithmetic, VecArith3, NONE)),
        (1156, Op("vor", VectorArithmetic, VecArith3, NONE)),
        (1220, Op("vxor", VectorArithmetic, VecArith3, NONE)),
        (1284, Op("vnor", VectorArithmetic, VecArith3, NONE)),
        (4, Op("vrlb", VectorArithmetic, VecArith3, NONE)),
        (68, Op("vrlh", VectorArithmetic, VecArith3, NONE)),
        (132, Op("vrlw", VectorArithmetic, VecArith3, NONE)),
        (260, Op("vslb", VectorArithmetic, VecArith3, NONE)),
        (324, Op("vslh", VectorArithmetic, VecArith3, NONE)),
        (388, Op("vslw", VectorArithmetic, VecArith3, NONE)),
        (516, Op("vsrb", VectorArithmetic, VecArith3, NONE)),
        (644, Op("vsrw", VectorArithmetic, VecArith3, NONE)),
        (772, Op("vsrab", VectorArithmetic, VecArith3, NONE)),
        (900, Op("vsraw", VectorArithmetic, VecArith3, NONE)),
        (778, Op("vcfux", VectorArithmetic, VecConvert, NONE)),
        (842, Op("vcfsx", VectorArithmetic, VecConvert, NONE)),
        (906, Op("vctuxs", VectorArithmetic, VecConvert, NONE)),
        (970, Op("vctsxs", VectorArithmetic, VecConvert, NONE)),
        (12, Op("vmrghb", VectorPermute, VecArith3, NONE)),
        (76, Op("vmrghh", VectorPermute, VecArith3, NONE)),
        (140, Op("vmrghw", VectorPermute, VecArith3, NONE)),
        (396, Op("vmrglw", VectorPermute, VecArith3, NONE)),
        (14, Op("vpkuhum", VectorPermute, VecArith3, NONE)),
        (524, Op("vspltb", VectorPermute, VecSplat, NONE)),
        (588, Op("vsplth", VectorPermute, VecSplat, NONE)),
        (652, Op("vspltw", VectorPermute, VecSplat, NONE)),
        (780, Op("vspltisb", VectorPermute, VecSplatImm, NONE)),
        (844, Op("vspltish", VectorPermute, VecSplatImm, NONE)),
        (908, Op("vspltisw", VectorPermute, VecSplatImm, NONE)),
        (1540, Op("mfvscr", SpecialRegister, MoveFromVscr, NONE)),
        (1604, Op("mtvscr", SpecialRegister, MoveToVscr, NONE)),
    ];
    let mut i = 0;
    while i < vx_forms.len() {
        let (xo, info) = vx_forms[i];
        table[xo] = info;
        i += 1;
    }

    table
}

static PRIMARY_TABLE: [InstructionInfo; 64] = build_primary_table();
static EXTENDED_TABLE: [InstructionInfo; 1024] = build_extended_table();
static BRANCH_COND_REG_TABLE: [InstructionInfo; 1024] = build_branch_cond_reg_table();
static ROTATE64_TABLE: [InstructionInfo; 16] = build_rotate64_table();
static LOAD_DOUBLE_TABLE: [InstructionInfo; 4] = build_load_double_table();
static STORE_DOUBLE_TABLE: [InstructionInfo; 4] = build_store_double_table();
static FLOAT_SINGLE_TABLE: [InstructionInfo; 32] = build_float_single_table();
static FLOAT_DOUBLE_TABLE: [InstructionInfo; 1024] = build_float_double_table();
static VECTOR_TABLE: [InstructionInfo; 2048] = build_vector_table();
