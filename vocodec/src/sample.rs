//! Sample representations accepted by the codecs.

mod sealed {
    pub trait Sealed {}
    impl Sealed for i16 {}
    impl Sealed for f32 {}
}

/// A PCM sample type the native engines understand: `i16` or `f32`.
pub trait Sample: sealed::Sealed + Copy + Default + 'static {
    /// Human readable name, used in logs.
    const NAME: &'static str;
}

impl Sample for i16 {
    const NAME: &'static str = "i16";
}

impl Sample for f32 {
    const NAME: &'static str = "f32";
}

/// Converts a float sample in `[-1.0, 1.0]` to the 16-bit integer domain.
///
/// Values outside the range clamp to `±32767`, so `1.5` encodes exactly like
/// `1.0` and `-2.0` exactly like `-1.0`. Rounding is `floor(0.5 + 32767 * x)`.
/// NaN maps to zero.
#[inline]
pub fn float_to_i16(x: f32) -> i16 {
    let x = x.clamp(-1.0, 1.0);
    (0.5 + 32767.0 * x).floor() as i16
}

/// Converts a whole frame with [`float_to_i16`]. Both slices must have the
/// same length.
pub fn floats_to_i16(src: &[f32], dst: &mut [i16]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d = float_to_i16(*s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(float_to_i16(1.0), 32767);
        assert_eq!(float_to_i16(-1.0), -32767);
        assert_eq!(float_to_i16(0.0), 0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(float_to_i16(1.5), float_to_i16(1.0));
        assert_eq!(float_to_i16(-2.0), float_to_i16(-1.0));
        assert_eq!(float_to_i16(f32::INFINITY), 32767);
        assert_eq!(float_to_i16(f32::NEG_INFINITY), -32767);
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(float_to_i16(0.6 / 32767.0), 1);
        assert_eq!(float_to_i16(0.4 / 32767.0), 0);
        assert_eq!(float_to_i16(-0.4 / 32767.0), 0);
        assert_eq!(float_to_i16(-0.6 / 32767.0), -1);
        assert_eq!(float_to_i16(0.5), 16384);
    }

    #[test]
    fn test_nan_is_silent() {
        assert_eq!(float_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_floats_to_i16() {
        let src = [0.0f32, 1.0, -1.0, 3.0];
        let mut dst = [7i16; 4];
        floats_to_i16(&src, &mut dst);
        assert_eq!(dst, [0, 32767, -32767, 32767]);
    }

    proptest! {
        #[test]
        fn prop_never_hits_i16_min(x in proptest::num::f32::ANY) {
            prop_assert!(float_to_i16(x) > i16::MIN);
        }

        #[test]
        fn prop_within_half_step(x in -1.0f32..=1.0) {
            let y = float_to_i16(x) as f32;
            prop_assert!((y - 32767.0 * x).abs() <= 0.5 + 1e-2);
        }

        #[test]
        fn prop_monotonic(a in -4.0f32..4.0, b in -4.0f32..4.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(float_to_i16(lo) <= float_to_i16(hi));
        }
    }
}
