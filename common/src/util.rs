/// Sign-extends the low `width` bits of `value`.
#[inline(always)]
pub fn sign_extend(value: u64, width: u32) -> i64 {
    debug_assert!(width > 0 && width <= 64);
    let shift = 64 - width;
    ((value << shift) as i64) >> shift
}

/// Mask covering the low `width` bits.
#[inline(always)]
pub fn low_mask(width: u32) -> u64 {
    (!0u64).checked_shr(64 - width).unwrap_or(0)
}

/// Returns true if `value` fits in a `width` bit field with the given signedness.
pub fn fits(value: i64, width: u32, signed: bool) -> bool {
    if signed {
        sign_extend(value as u64 & low_mask(width), width) == value
    } else {
        value >= 0 && (value as u64) & !low_mask(width) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0xffff, 16), -1);
        assert_eq!(sign_extend(0x7fff, 16), 0x7fff);
        assert_eq!(sign_extend(0x200, 10), -512);
        assert_eq!(sign_extend(0x40, 7), -64);
        assert_eq!(sign_extend(0x3f, 7), 63);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn masks() {
        assert_eq!(low_mask(0), 0);
        assert_eq!(low_mask(5), 0x1f);
        assert_eq!(low_mask(64), u64::MAX);
    }

    #[test]
    fn field_fits() {
        assert!(fits(-1, 16, true));
        assert!(!fits(-1, 16, false));
        assert!(fits(0xffff, 16, false));
        assert!(!fits(0x10000, 16, false));
        assert!(!fits(0x8000, 16, true));
    }
}
