/// Relative gap between two magnitudes, in `[0, 1]`.
///
/// Policy, first match wins: NaN or infinite operand -> 1, equal -> 0,
/// strict sign mismatch -> 1, otherwise `|a - b| / max(|a|, |b|)`.
/// `gap(inf, inf)` is therefore 1.
pub fn gap(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return 1.0;
    }
    if a.is_infinite() || b.is_infinite() {
        return 1.0;
    }
    if a == b {
        return 0.0;
    }
    if a * b < 0.0 {
        return 1.0;
    }
    (a - b).abs() / a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        assert!((gap(11.0, 10.0) - 1.0 / 11.0).abs() < 1e-12);
        assert_eq!(gap(0.0, 0.0), 0.0);
        assert_eq!(gap(0.0, 5.0), 1.0);
        assert_eq!(gap(-3.0, 3.0), 1.0);
        assert_eq!(gap(-4.0, -2.0), 0.5);
    }

    #[test]
    fn infinite_operand_is_worst_case() {
        assert_eq!(gap(f64::INFINITY, 1.0), 1.0);
        assert_eq!(gap(1.0, f64::NEG_INFINITY), 1.0);
        assert_eq!(gap(f64::INFINITY, f64::INFINITY), 1.0);
        assert_eq!(gap(f64::NAN, 1.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_self_gap_is_zero(a in -1e12f64..1e12) {
            prop_assert_eq!(gap(a, a), 0.0);
        }

        #[test]
        fn prop_symmetric(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            prop_assert_eq!(gap(a, b), gap(b, a));
        }

        #[test]
        fn prop_bounded(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let g = gap(a, b);
            prop_assert!((0.0..=1.0).contains(&g));
        }

        #[test]
        fn prop_sign_mismatch(a in 1e-6f64..1e9, b in 1e-6f64..1e9) {
            prop_assert_eq!(gap(a, -b), 1.0);
            prop_assert_eq!(gap(-a, b), 1.0);
        }
    }
}
