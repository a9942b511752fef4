//! PPU instruction formats.
//!
//! Fields are declared least significant bit first, so the names below appear in the reverse
//! of the order the PowerPC books draw them.

use modular_bitfield::{bitfield, specifiers::*};

macro_rules! word_form {
    ($($form:ident),* $(,)?) => {
        $(
            impl From<u32> for $form {
                #[inline(always)]
                fn from(word: u32) -> Self {
                    $form::from_bytes(word.to_le_bytes())
                }
            }

            impl From<$form> for u32 {
                #[inline(always)]
                fn from(form: $form) -> u32 {
                    u32::from_le_bytes(form.into_bytes())
                }
            }
        )*
    };
}

/// Immediate/displacement form: `addi`, `lwz`, `ori`, `cmpi`, `twi`...
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct DForm {
    pub d: B16,
    pub ra: B5,
    pub rt: B5,
    pub opcd: B6,
}

/// 64-bit loads and stores, displacement in words.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct DsForm {
    pub xo: B2,
    pub ds: B14,
    pub ra: B5,
    pub rt: B5,
    pub opcd: B6,
}

/// Unconditional branch.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct IForm {
    pub lk: bool,
    pub aa: bool,
    pub li: B24,
    pub opcd: B6,
}

/// Conditional branch.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct BForm {
    pub lk: bool,
    pub aa: bool,
    pub bd: B14,
    pub bi: B5,
    pub bo: B5,
    pub opcd: B6,
}

/// Register forms. Also covers XL (rt = BO/BT, ra = BI/BA, rb = BB, rc = LK), XFX (SPR and
/// CR field masks spread over ra/rb) and XS (`sradi`, low xo bit is sh5).
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct XForm {
    pub rc: bool,
    pub xo: B10,
    pub rb: B5,
    pub ra: B5,
    pub rt: B5,
    pub opcd: B6,
}

/// Integer arithmetic with overflow enable.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct XoForm {
    pub rc: bool,
    pub xo: B9,
    pub oe: bool,
    pub rb: B5,
    pub ra: B5,
    pub rt: B5,
    pub opcd: B6,
}

/// 32-bit rotates. `rb` holds the shift amount in the immediate variants.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct MForm {
    pub rc: bool,
    pub me: B5,
    pub mb: B5,
    pub rb: B5,
    pub ra: B5,
    pub rs: B5,
    pub opcd: B6,
}

/// 64-bit rotate by immediate. Both `sh` and `mb` are split 6-bit values.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct MdForm {
    pub rc: bool,
    pub sh5: bool,
    pub xo: B3,
    pub mb: B6,
    pub sh: B5,
    pub ra: B5,
    pub rs: B5,
    pub opcd: B6,
}

/// 64-bit rotate by register.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct MdsForm {
    pub rc: bool,
    pub xo: B4,
    pub mb: B6,
    pub rb: B5,
    pub ra: B5,
    pub rs: B5,
    pub opcd: B6,
}

/// Floating point arithmetic.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct AForm {
    pub rc: bool,
    pub xo: B5,
    pub frc: B5,
    pub frb: B5,
    pub fra: B5,
    pub frt: B5,
    pub opcd: B6,
}

/// VMX two operand form, also VXR (compares, xo bit 10 is Rc).
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct VxForm {
    pub xo: B11,
    pub vb: B5,
    pub va: B5,
    pub vd: B5,
    pub opcd: B6,
}

/// VMX three operand form.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct VaForm {
    pub xo: B6,
    pub vc: B5,
    pub vb: B5,
    pub va: B5,
    pub vd: B5,
    pub opcd: B6,
}

word_form!(DForm, DsForm, IForm, BForm, XForm, XoForm, MForm, MdForm, MdsForm, AForm, VxForm, VaForm);

impl MdForm {
    /// Six bit shift amount.
    pub fn shift(&self) -> u8 {
        self.sh() | (self.sh5() as u8) << 5
    }
}

/// Reassembles the split MB/ME field of MD and MDS forms.
#[inline(always)]
pub fn mask_begin64(field: u8) -> u8 {
    (field >> 1) | (field & 1) << 5
}

/// Inverse of [`mask_begin64`].
#[inline(always)]
pub fn mask_begin64_field(mb: u8) -> u8 {
    (mb & 0x1f) << 1 | (mb >> 5) & 1
}

/// SPR numbers are encoded with their two 5-bit halves swapped.
#[inline(always)]
pub fn spr(x: XForm) -> u16 {
    x.ra() as u16 | (x.rb() as u16) << 5
}

/// `mtcrf` field mask, bits 12..19 of the word.
#[inline(always)]
pub fn crm(x: XForm) -> u8 {
    (x.ra() & 0xf) << 4 | x.rb() >> 1
}

/// `mtfsf` field mask, bits 7..14 of the word.
#[inline(always)]
pub fn flm(x: XForm) -> u8 {
    (x.rt() & 0xf) << 4 | x.ra() >> 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d_form_layout() {
        let d = DForm::from(0x3864_002a); // addi r3, r4, 42
        assert_eq!(d.opcd(), 14);
        assert_eq!(d.rt(), 3);
        assert_eq!(d.ra(), 4);
        assert_eq!(d.d(), 42);
        assert_eq!(u32::from(d), 0x3864_002a);
    }

    #[test]
    fn split_fields() {
        let x = XForm::from(0x7c08_02a6); // mflr r0
        assert_eq!(spr(x), 8);

        for mb in 0..64 {
            assert_eq!(mask_begin64(mask_begin64_field(mb)), mb);
        }
        assert_eq!(mask_begin64(1), 32);
    }
}
