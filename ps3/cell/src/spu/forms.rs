//! SPU instruction formats. Like the PPU forms, fields are listed least significant bit first.
//!
//! All SPU formats put the opcode at the top of the word, but its width varies between 4 and
//! 11 bits depending on how much room the operands need.

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

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Rr {
    pub rt: B7,
    pub ra: B7,
    pub rb: B7,
    pub op: B11,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Rrr {
    pub rc: B7,
    pub ra: B7,
    pub rb: B7,
    pub rt: B7,
    pub op: B4,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Ri7 {
    pub rt: B7,
    pub ra: B7,
    pub i7: B7,
    pub op: B11,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Ri8 {
    pub rt: B7,
    pub ra: B7,
    pub i8: B8,
    pub op: B10,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Ri10 {
    pub rt: B7,
    pub ra: B7,
    pub i10: B10,
    pub op: B8,
}

#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Ri16 {
    pub rt: B7,
    pub i16: B16,
    pub op: B9,
}

/// Also the layout of `hbra`/`hbrr`, where the top two immediate bits are ROH and `rt`
/// holds ROL.
#[bitfield(bits = 32)]
#[derive(Debug, Copy, Clone)]
pub struct Ri18 {
    pub rt: B7,
    pub i18: B18,
    pub op: B7,
}

word_form!(Rr, Rrr, Ri7, Ri8, Ri10, Ri16, Ri18);

/// Signal type of `stop`/`stopd`.
#[inline(always)]
pub fn stop_signal(word: u32) -> u32 {
    word & 0x3fff
}

/// Hint offset of `hbr`, in instructions: ROH sits in the low bits of the rb field.
#[inline(always)]
pub fn hint_offset_rr(rr: Rr) -> u16 {
    (((rr.rb() >> 2) & 3) as u16) << 7 | rr.rt() as u16
}

/// Hint offset of `hbra`/`hbrr`, in instructions.
#[inline(always)]
pub fn hint_offset_ri18(ri: Ri18) -> u16 {
    ((ri.i18() >> 16) as u16 & 3) << 7 | ri.rt() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts() {
        let rr = Rr::from(0x1800_c285); // a $5, $5, $3
        assert_eq!(rr.op(), 0x0c0);
        assert_eq!((rr.rt(), rr.ra(), rr.rb()), (5, 5, 3));

        let rrr = Rrr::from(0xb061_0101); // shufb $3, $2, $4, $1
        assert_eq!(rrr.op(), 0xb);
        assert_eq!((rrr.rt(), rrr.ra(), rrr.rb(), rrr.rc()), (3, 2, 4, 1));

        let ri10 = Ri10::from(0x1c00_4183); // ai $3, $3, 1
        assert_eq!(ri10.op(), 0x1c);
        assert_eq!((ri10.rt(), ri10.ra(), ri10.i10()), (3, 3, 1));
        assert_eq!(u32::from(ri10), 0x1c00_4183);
    }

    #[test]
    fn hint_offsets() {
        let hbrr = Ri18::new().with_op(0x09).with_rt(0x10).with_i18(2 << 16 | 0x20);
        assert_eq!(hint_offset_ri18(hbrr), 2 << 7 | 0x10);

        let hbr = Rr::new().with_op(0x1ac).with_rt(0x7f).with_rb(1 << 2);
        assert_eq!(hint_offset_rr(hbr), 1 << 7 | 0x7f);
    }
}
