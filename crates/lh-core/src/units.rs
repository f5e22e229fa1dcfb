// lh-core/src/units.rs

use uom::si::f64::Volume as UomVolume;
use uom::si::volume::{microliter, nanoliter};

/// Canonical volume type (SI, f64).
pub type Volume = UomVolume;

#[inline]
pub fn ul(v: f64) -> Volume {
    Volume::new::<microliter>(v)
}

#[inline]
pub fn nl(v: f64) -> Volume {
    Volume::new::<nanoliter>(v)
}

#[inline]
pub fn as_ul(v: Volume) -> f64 {
    v.get::<microliter>()
}

#[inline]
pub fn as_nl(v: Volume) -> f64 {
    v.get::<nanoliter>()
}

/// Microliters to a whole number of nanoliters, rounded to the nearest integer.
///
/// The result is still an `f64`; callers convert to an integer type after
/// checking range.
#[inline]
pub fn ul_to_whole_nl(v_ul: f64) -> f64 {
    as_nl(ul(v_ul)).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _a = ul(1.0);
        let _b = nl(25.0);
    }

    #[test]
    fn microliter_nanoliter_conversion() {
        assert!((as_nl(ul(0.5)) - 500.0).abs() < 1e-9);
        assert!((as_ul(nl(2500.0)) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn whole_nanoliters_round() {
        assert_eq!(ul_to_whole_nl(0.5), 500.0);
        assert_eq!(ul_to_whole_nl(0.0254), 25.0);
        assert_eq!(ul_to_whole_nl(0.0256), 26.0);
        assert_eq!(ul_to_whole_nl(1.1), 1100.0);
    }
}
