use crate::LhError;

/// Demand below this many microliters counts as satisfied.
pub const VOLUME_EPSILON_UL: f64 = 1e-9;

/// Two volumes in microliters are equal up to [`VOLUME_EPSILON_UL`], scaled
/// for volumes above 1 uL.
pub fn volumes_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= VOLUME_EPSILON_UL * a.abs().max(b.abs()).max(1.0)
}

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, LhError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(LhError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_volume(v: f64, what: &'static str) -> Result<f64, LhError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(LhError::Negative { what, value: v });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumes_match_scales_with_magnitude() {
        assert!(volumes_match(81.0, 80.0 + 1.0));
        assert!(volumes_match(0.0, 1e-10));
        assert!(volumes_match(2000.0, 2000.0 + 1e-7));
        assert!(!volumes_match(1.0, 1.0 + 1e-6));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_volume_rejects_negative() {
        assert_eq!(ensure_volume(2.5, "volume").unwrap(), 2.5);
        assert!(matches!(
            ensure_volume(-0.1, "volume"),
            Err(LhError::Negative { .. })
        ));
        assert!(matches!(
            ensure_volume(f64::INFINITY, "volume"),
            Err(LhError::NonFinite { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn volumes_match_is_reflexive_and_symmetric(a in -1e4_f64..1e4, b in -1e4_f64..1e4) {
            prop_assert!(volumes_match(a, a));
            prop_assert_eq!(volumes_match(a, b), volumes_match(b, a));
        }

        #[test]
        fn micro_differences_never_match(a in -1e4_f64..1e4) {
            let b = a + 1e-6 * a.abs().max(1.0);
            prop_assert!(!volumes_match(a, b));
        }
    }
}
